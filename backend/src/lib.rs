//! # WaterWatch
//!
//! Area selection, request validation and dispatch for satellite water
//! quality analyses, plus the HTTP gateway that runs the analysis scripts.
//!
//! ## Architecture
//!
//! - [`models`]: bounding boxes, requests, results and the tagged
//!   [`models::AnalysisOutcome`]
//! - [`services`]: validator, drawing state machine, result presentation,
//!   subprocess runner and run tracker
//! - [`client`]: HTTP dispatch client with an explicit session context
//! - [`config`]: TOML + environment configuration for the gateway
//! - [`http`]: Axum-based gateway (feature `http-server`)
//!
//! ## Flow
//!
//! A drag on the map goes through [`services::DrawingController`] and yields
//! a [`models::BoundingBox`]; [`models::AnalysisRequest::build`] validates it
//! together with the date range and data source; [`client::AnalysisClient`]
//! posts it to the gateway, which runs the script and answers with metrics or
//! an error, mapped back into an outcome the result view can render.

pub mod client;
pub mod config;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
