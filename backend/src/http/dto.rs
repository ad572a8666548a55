//! Data Transfer Objects for the HTTP API.
//!
//! Request and response bodies mostly live in [`crate::models`]; they are
//! re-exported here next to the gateway-only types.

use serde::{Deserialize, Serialize};

pub use crate::models::cyfi::{CyFiRequestBody, CyFiResult};
pub use crate::models::request::AnalysisRequestBody;
pub use crate::models::result::{AnalysisFailure, AnalysisMetrics, AnalysisResponse};
pub use crate::services::tracker::StatusReport;

/// Response for the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
