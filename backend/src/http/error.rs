//! Error bodies returned by the gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::runner::RunnerError;
use crate::services::validation::ValidationReport;

/// API error response body.
///
/// The human-readable message travels in `error` so that clients which only
/// look for an `error` field treat every error body as a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable machine-readable code, e.g. `VALIDATION_ERROR`
    pub code: String,
    pub error: String,
    /// Script stderr or parser message, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Individual validation messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
            details: None,
            issues: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Everything a handler can fail with, mapped to a status and an [`ApiError`].
#[derive(Debug)]
pub enum AppError {
    /// Unknown analysis id
    NotFound(String),
    /// Invalid request
    BadRequest(String),
    /// Request failed validation; every violation is reported
    Validation(ValidationReport),
    /// Subprocess runner error
    Runner(RunnerError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Validation(report) => {
                let mut error = ApiError::new("VALIDATION_ERROR", report.joined());
                error.issues = report.into_errors();
                (StatusCode::BAD_REQUEST, error)
            }
            AppError::Runner(e) => {
                let message = e.to_string();
                match e {
                    RunnerError::ScriptNotFound(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("SCRIPT_NOT_FOUND", "Analysis script not found"),
                    ),
                    RunnerError::ScriptFailed { stderr, .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("ANALYSIS_FAILED", "Analysis failed").with_details(stderr),
                    ),
                    RunnerError::InvalidOutput(details) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("INVALID_OUTPUT", "Failed to parse analysis results")
                            .with_details(details),
                    ),
                    RunnerError::Timeout(_) => (
                        StatusCode::GATEWAY_TIMEOUT,
                        ApiError::new("TIMEOUT", message),
                    ),
                    RunnerError::Io(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("INTERNAL_ERROR", message),
                    ),
                }
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RunnerError> for AppError {
    fn from(err: RunnerError) -> Self {
        AppError::Runner(err)
    }
}

impl From<ValidationReport> for AppError {
    fn from(report: ValidationReport) -> Self {
        AppError::Validation(report)
    }
}
