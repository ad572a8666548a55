//! Domain types shared by the client and the gateway.

pub mod bbox;
pub mod cyfi;
pub mod request;
pub mod result;

pub use bbox::{parse_coordinates, BboxParseError, BoundingBox, LonLat};
pub use cyfi::{CyFiRequest, CyFiRequestBody, CyFiResult, Severity};
pub use request::{AnalysisRequest, AnalysisRequestBody, DataSource, TimeInterval};
pub use result::{
    AnalysisFailure, AnalysisMetrics, AnalysisOutcome, AnalysisResponse, WaterQualityMetrics,
};
