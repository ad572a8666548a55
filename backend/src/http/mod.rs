//! HTTP gateway in front of the analysis scripts.
//!
//! ```text
//!   client ──POST /api/water-quality──▶ handlers ──▶ validation
//!                                          │
//!                                          ├──▶ AnalysisTracker (status polling)
//!                                          │
//!                                          └──▶ AnalysisRunner ──▶ script subprocess
//!                                                                     │
//!   client ◀──GET /results/<name>.png── ServeDir ◀── images + data ◀──┘
//! ```
//!
//! Handlers never talk to the subprocess directly; [`AppState`] carries an
//! `Arc<dyn AnalysisRunner>` so tests can swap in a canned runner.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
