//! WaterWatch gateway binary.
//!
//! Loads configuration, builds the router and serves the analysis API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin waterwatch-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `WATERWATCH_PYTHON`: Interpreter used for the analysis scripts
//! - `WATERWATCH_RESULTS_DIR`: Directory for generated images and data
//! - `WATERWATCH_TIMEOUT_SECS`: Script timeout (default: 180)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use waterwatch::config::{ConfigError, WaterWatchConfig};
use waterwatch::http::{create_router, AppState};
use waterwatch::services::{AnalysisTracker, PythonRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting WaterWatch gateway");

    let config = match WaterWatchConfig::from_default_location() {
        Ok(config) => config,
        Err(ConfigError::NotFound) => {
            warn!("No waterwatch.toml found, using defaults");
            WaterWatchConfig::default()
        }
        Err(e) => return Err(e.into()),
    }
    .apply_env_overrides()?;

    info!(
        "Analysis scripts run with '{}', results in {}",
        config.analysis.python,
        config.analysis.results_dir.display()
    );

    let results_dir = config.analysis.results_dir.clone();
    let runner = Arc::new(PythonRunner::new(config.analysis.clone()));
    let tracker = AnalysisTracker::with_retention(config.analysis.retention());
    let state = AppState::new(runner, results_dir).with_tracker(tracker);
    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
