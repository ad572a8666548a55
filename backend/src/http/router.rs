//! Route table and middleware stack of the gateway.

use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{analyze_cyfi, analyze_water_quality, get_analysis_status, health_check};
use super::state::AppState;
use crate::services::runner::RESULTS_ROUTE;

fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/water-quality", post(analyze_water_quality))
        .route("/cyfi/analyze", post(analyze_cyfi))
        .route("/cyfi/status/{analysis_id}", get(get_analysis_status))
        .route("/analyses/{analysis_id}", get(get_analysis_status))
}

/// Build the gateway: health probe, `/api` analysis routes and the generated
/// images under `/results`.
pub fn create_router(state: AppState) -> Router {
    // The map UI is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let results = ServeDir::new(&state.results_dir);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", analysis_routes())
        .nest_service(RESULTS_ROUTE, results)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
