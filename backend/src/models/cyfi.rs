//! CyFi algal-bloom analysis types.

use serde::{Deserialize, Serialize};

use super::bbox::{BoundingBox, LonLat};

/// Body of `POST /api/cyfi/analyze`. Fields are optional on the wire so a
/// missing parameter can be reported as a 400 instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyFiRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<f64>,
}

impl CyFiRequestBody {
    pub fn into_request(self) -> Option<CyFiRequest> {
        match (self.bbox, self.date) {
            (Some(bbox), Some(date)) if !date.trim().is_empty() => Some(CyFiRequest {
                bbox,
                date,
                grid_size: self.grid_size,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyFiRequest {
    pub bbox: BoundingBox,
    pub date: String,
    pub grid_size: Option<f64>,
}

impl From<CyFiRequest> for CyFiRequestBody {
    fn from(request: CyFiRequest) -> Self {
        Self {
            bbox: Some(request.bbox),
            date: Some(request.date),
            grid_size: request.grid_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyFiPredictions {
    pub density_cells_per_ml: f64,
    pub severity: Severity,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyFiMetadata {
    #[serde(default)]
    pub points_analyzed: Option<u64>,
    pub date_analyzed: String,
    #[serde(default)]
    pub grid_size: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyFiLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<CyFiLocation> for LonLat {
    fn from(location: CyFiLocation) -> Self {
        LonLat::new(location.longitude, location.latitude)
    }
}

/// Result printed by the CyFi CLI, plus the gateway's tracking id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyFiResult {
    pub timestamp: String,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub location: Option<CyFiLocation>,
    pub predictions: CyFiPredictions,
    pub metadata: CyFiMetadata,
    #[serde(rename = "analysisId", default)]
    pub analysis_id: Option<String>,
}
