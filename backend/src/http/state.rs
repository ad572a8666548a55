//! Application state for the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use crate::services::runner::AnalysisRunner;
use crate::services::tracker::AnalysisTracker;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs the analysis scripts
    pub runner: Arc<dyn AnalysisRunner>,
    /// Status of runs, polled by clients
    pub tracker: AnalysisTracker,
    /// Directory served under `/results`
    pub results_dir: PathBuf,
}

impl AppState {
    /// Create a new application state with the given runner.
    pub fn new(runner: Arc<dyn AnalysisRunner>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            tracker: AnalysisTracker::new(),
            results_dir: results_dir.into(),
        }
    }

    pub fn with_tracker(mut self, tracker: AnalysisTracker) -> Self {
        self.tracker = tracker;
        self
    }
}
