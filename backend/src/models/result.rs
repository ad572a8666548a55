//! Analysis results and the tagged outcome built at the response boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Percentages computed by one water classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterQualityMetrics {
    #[serde(default)]
    pub water_coverage: f64,
    #[serde(default)]
    pub clear_water: f64,
    #[serde(default)]
    pub moderate_quality: f64,
    #[serde(default)]
    pub algal_presence: f64,
}

/// Success payload of a water quality analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    pub ndwi_analysis: WaterQualityMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_analysis: Option<WaterQualityMetrics>,
    #[serde(rename = "mlAnalysisAvailable", default)]
    pub ml_analysis_available: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "rgbImageUrl", default, skip_serializing_if = "Option::is_none")]
    pub rgb_image_url: Option<String>,
    #[serde(rename = "detailedNdwiUrl", default, skip_serializing_if = "Option::is_none")]
    pub detailed_ndwi_url: Option<String>,
    #[serde(rename = "dataSource", default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(rename = "trueColorAvailable", default, skip_serializing_if = "Option::is_none")]
    pub true_color_available: Option<bool>,
    #[serde(
        rename = "waterDetectionAvailable",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub water_detection_available: Option<bool>,
    /// Gateway tracking id, pollable under `/api/analyses/{id}`.
    #[serde(rename = "analysisId", default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
}

/// Failure payload: a message and, when the analysis got far enough, a
/// diagnostic image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub error: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "analysisId", default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
}

impl AnalysisFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            image_url: None,
            details: None,
            analysis_id: None,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Body of a water quality response as produced by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Failure(AnalysisFailure),
    Metrics(AnalysisMetrics),
}

impl AnalysisResponse {
    /// Stamp the gateway's tracking id onto either branch.
    pub fn with_analysis_id(mut self, analysis_id: impl Into<String>) -> Self {
        let analysis_id = Some(analysis_id.into());
        match &mut self {
            AnalysisResponse::Failure(failure) => failure.analysis_id = analysis_id,
            AnalysisResponse::Metrics(metrics) => metrics.analysis_id = analysis_id,
        }
        self
    }
}

/// What the caller gets back from one analysis submission.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Full metrics payload.
    Success(AnalysisMetrics),
    /// The service answered but the analysis failed; the error is shown
    /// together with the diagnostic image when there is one.
    SoftFailure {
        error: String,
        image_url: Option<String>,
    },
    /// Nothing usable came back (transport, timeout, undecodable body).
    HardFailure { error: String },
}

impl AnalysisOutcome {
    pub fn hard(error: impl Into<String>) -> Self {
        AnalysisOutcome::HardFailure {
            error: error.into(),
        }
    }

    /// Map a decoded response body.
    ///
    /// Only the presence of a non-null `error` field selects the failure
    /// branch; the HTTP status that carried the body is ignored.
    pub fn from_body(body: Value) -> Self {
        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let error = match error {
                Value::String(message) => message.clone(),
                // `{"error": true, "message": "..."}` as printed by the CyFi CLI
                other => body
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            };
            let image_url = body
                .get("imageUrl")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_string);
            return AnalysisOutcome::SoftFailure { error, image_url };
        }

        match serde_json::from_value::<AnalysisMetrics>(body) {
            Ok(metrics) => AnalysisOutcome::Success(metrics),
            Err(e) => AnalysisOutcome::hard(format!("Unexpected analysis response: {}", e)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::SoftFailure { error, .. } | AnalysisOutcome::HardFailure { error } => {
                Some(error)
            }
        }
    }

    /// Image to show next to the result or error, if any.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success(metrics) => Some(&metrics.image_url),
            AnalysisOutcome::SoftFailure { image_url, .. } => image_url.as_deref(),
            AnalysisOutcome::HardFailure { .. } => None,
        }
    }
}

impl From<AnalysisResponse> for AnalysisOutcome {
    fn from(response: AnalysisResponse) -> Self {
        match response {
            AnalysisResponse::Metrics(metrics) => AnalysisOutcome::Success(metrics),
            AnalysisResponse::Failure(failure) => AnalysisOutcome::SoftFailure {
                error: failure.error,
                image_url: failure.image_url,
            },
        }
    }
}
