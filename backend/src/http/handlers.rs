//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! validation and runner services.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{
    AnalysisFailure, AnalysisRequestBody, AnalysisResponse, CyFiRequestBody, HealthResponse,
    StatusReport,
};
use super::error::AppError;
use super::state::AppState;
use crate::services::runner::RunnerError;
use crate::services::tracker::{AnalysisKind, LogLevel};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Progress reported once the script has been launched.
const PROGRESS_STARTED: u8 = 10;

fn new_analysis_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", chrono::Utc::now().timestamp_millis(), &suffix[..8])
}

fn decode_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text())))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check() -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        service: "waterwatch".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

// =============================================================================
// Analyses
// =============================================================================

/// POST /api/water-quality
///
/// Validation problems are a 400. Once the script has run the answer is
/// always a 200, carrying either metrics or an `error` (with the diagnostic
/// image when one was produced).
pub async fn analyze_water_quality(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequestBody>, JsonRejection>,
) -> HandlerResult<AnalysisResponse> {
    let body = decode_body(payload)?;
    info!(
        "Received water quality analysis request for bbox {:?}, interval {:?}, source {}",
        body.bbox_coords,
        body.time_interval,
        body.data_source_or_default()
    );

    let request = body.into_request().map_err(|report| {
        warn!("Rejected analysis request: {}", report);
        AppError::from(report)
    })?;

    let analysis_id = new_analysis_id();
    state.tracker.register(&analysis_id, AnalysisKind::WaterQuality);
    state.tracker.set_progress(&analysis_id, PROGRESS_STARTED);
    state.tracker.log(
        &analysis_id,
        LogLevel::Info,
        format!(
            "Water quality analysis of {} using {}",
            request.bbox, request.data_source
        ),
    );

    match state.runner.run_water_quality(&analysis_id, &request).await {
        Ok(response) => {
            match &response {
                AnalysisResponse::Metrics(_) => state.tracker.complete(&analysis_id),
                AnalysisResponse::Failure(failure) => {
                    if let Some(image_url) = &failure.image_url {
                        state.tracker.log(
                            &analysis_id,
                            LogLevel::Warning,
                            format!("Diagnostic image at {}", image_url),
                        );
                    }
                    state.tracker.fail(&analysis_id, &failure.error)
                }
            }
            Ok(Json(response.with_analysis_id(analysis_id)))
        }
        Err(e @ RunnerError::ScriptNotFound(_)) => {
            state.tracker.fail(&analysis_id, e.to_string());
            Err(e.into())
        }
        Err(e) => {
            error!("Error processing water quality analysis: {}", e);
            let message = format!("Failed to process water quality analysis: {}", e);
            state.tracker.fail(&analysis_id, &message);
            let response = AnalysisResponse::Failure(AnalysisFailure::new(message));
            Ok(Json(response.with_analysis_id(analysis_id)))
        }
    }
}

/// POST /api/cyfi/analyze
pub async fn analyze_cyfi(
    State(state): State<AppState>,
    payload: Result<Json<CyFiRequestBody>, JsonRejection>,
) -> HandlerResult<Value> {
    let request = decode_body(payload)?
        .into_request()
        .ok_or_else(|| AppError::BadRequest("Missing required parameters".to_string()))?;

    let analysis_id = state.tracker.create(AnalysisKind::Cyfi);
    state.tracker.set_progress(&analysis_id, PROGRESS_STARTED);
    state.tracker.log(
        &analysis_id,
        LogLevel::Info,
        format!("CyFi analysis of {} on {}", request.bbox, request.date),
    );

    match state.runner.run_cyfi(&request).await {
        Ok(mut result) => {
            state.tracker.complete(&analysis_id);
            if let Value::Object(fields) = &mut result {
                fields.insert("analysisId".to_string(), Value::String(analysis_id));
            }
            Ok(Json(result))
        }
        Err(e) => {
            state.tracker.fail(&analysis_id, e.to_string());
            Err(e.into())
        }
    }
}

/// GET /api/analyses/{analysis_id}
/// GET /api/cyfi/status/{analysis_id}
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> HandlerResult<StatusReport> {
    state
        .tracker
        .get(&analysis_id)
        .map(|run| Json(StatusReport::from(&run)))
        .ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", analysis_id)))
}
