//! In-memory status tracking for analysis runs.
//!
//! Every analysis the gateway starts is registered here so clients can poll
//! its progress while the subprocess runs. Finished runs are dropped once
//! they are older than the retention window.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// How long a finished run stays available for polling.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    WaterQuality,
    Cyfi,
}

/// Tracked analysis run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub kind: AnalysisKind,
    pub status: AnalysisStatus,
    /// 0..=100
    pub progress: u8,
    pub error: Option<String>,
    pub logs: Vec<LogEntry>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Public view of a run, as returned by the status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub analysis_id: String,
    pub status: AnalysisStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl From<&AnalysisRecord> for StatusReport {
    fn from(run: &AnalysisRecord) -> Self {
        Self {
            analysis_id: run.analysis_id.clone(),
            status: run.status,
            progress: run.progress,
            error: run.error.clone(),
            logs: run.logs.clone(),
        }
    }
}

impl AnalysisRecord {
    fn is_finished(&self) -> bool {
        matches!(
            self.status,
            AnalysisStatus::Completed | AnalysisStatus::Failed
        )
    }

    /// Finished longer ago than `retention`. Running runs never expire.
    fn expired(&self, now: chrono::DateTime<chrono::Utc>, retention: Duration) -> bool {
        match self.completed_at {
            Some(done) if self.is_finished() => (now - done)
                .to_std()
                .map_or(false, |age| age > retention),
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct AnalysisTracker {
    runs: Arc<RwLock<HashMap<String, AnalysisRecord>>>,
    retention: Duration,
}

impl Default for AnalysisTracker {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl AnalysisTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    /// Drop finished runs older than the retention window. Returns how many
    /// were removed.
    pub fn prune(&self) -> usize {
        let now = chrono::Utc::now();
        let mut runs = self.runs.write();
        let before = runs.len();
        runs.retain(|_, run| !run.expired(now, self.retention));
        let removed = before - runs.len();
        if removed > 0 {
            log::debug!("pruned {} finished analysis runs", removed);
        }
        removed
    }

    /// Register a run under a fresh random id.
    pub fn create(&self, kind: AnalysisKind) -> String {
        let analysis_id = Uuid::new_v4().to_string();
        self.register(analysis_id.clone(), kind);
        analysis_id
    }

    /// Register a run under a caller-chosen id (replacing any previous run
    /// with the same id).
    pub fn register(&self, analysis_id: impl Into<String>, kind: AnalysisKind) {
        let analysis_id = analysis_id.into();
        let record = AnalysisRecord {
            analysis_id: analysis_id.clone(),
            kind,
            status: AnalysisStatus::Pending,
            progress: 0,
            error: None,
            logs: vec![],
            created_at: chrono::Utc::now(),
            completed_at: None,
        };
        self.prune();
        self.runs.write().insert(analysis_id, record);
    }

    /// Mark a run as processing with the given progress.
    pub fn set_progress(&self, analysis_id: &str, progress: u8) {
        if let Some(run) = self.runs.write().get_mut(analysis_id) {
            run.status = AnalysisStatus::Processing;
            run.progress = progress.min(100);
        }
    }

    pub fn log(&self, analysis_id: &str, level: LogLevel, message: impl Into<String>) {
        if let Some(run) = self.runs.write().get_mut(analysis_id) {
            run.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    pub fn complete(&self, analysis_id: &str) {
        if let Some(run) = self.runs.write().get_mut(analysis_id) {
            run.status = AnalysisStatus::Completed;
            run.progress = 100;
            run.completed_at = Some(chrono::Utc::now());
        }
    }

    pub fn fail(&self, analysis_id: &str, error_message: impl Into<String>) {
        let error_message = error_message.into();
        if let Some(run) = self.runs.write().get_mut(analysis_id) {
            run.status = AnalysisStatus::Failed;
            run.completed_at = Some(chrono::Utc::now());
            run.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level: LogLevel::Error,
                message: error_message.clone(),
            });
            run.error = Some(error_message);
        }
    }

    pub fn get(&self, analysis_id: &str) -> Option<AnalysisRecord> {
        self.runs.read().get(analysis_id).cloned()
    }

    pub fn get_logs(&self, analysis_id: &str) -> Vec<LogEntry> {
        self.runs
            .read()
            .get(analysis_id)
            .map(|run| run.logs.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let tracker = AnalysisTracker::new();
        let id = tracker.create(AnalysisKind::Cyfi);
        let run = tracker.get(&id).unwrap();
        assert_eq!(run.status, AnalysisStatus::Pending);
        assert_eq!(run.progress, 0);

        tracker.set_progress(&id, 10);
        assert_eq!(tracker.get(&id).unwrap().status, AnalysisStatus::Processing);

        tracker.complete(&id);
        let run = tracker.get(&id).unwrap();
        assert_eq!(run.status, AnalysisStatus::Completed);
        assert_eq!(run.progress, 100);
        assert!(run.completed_at.is_some());

        let json = serde_json::to_value(StatusReport::from(&run)).unwrap();
        assert_eq!(json["analysisId"], id.as_str());
        assert_eq!(json["status"], "completed");
        assert!(json.get("error").is_none());
        assert_eq!(json["logs"], serde_json::json!([]));
    }

    #[test]
    fn test_fail_records_error() {
        let tracker = AnalysisTracker::new();
        tracker.register("1700000000000", AnalysisKind::WaterQuality);
        tracker.log("1700000000000", LogLevel::Info, "started");
        tracker.fail("1700000000000", "timed out");
        let run = tracker.get("1700000000000").unwrap();
        assert_eq!(run.status, AnalysisStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("timed out"));
        assert_eq!(run.logs.len(), 2);

        let logs = tracker.get_logs("1700000000000");
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[1].level, LogLevel::Error);
        assert_eq!(logs[1].message, "timed out");
        assert_eq!(StatusReport::from(&run).logs, logs);
        assert!(tracker.get_logs("missing").is_empty());
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let tracker = AnalysisTracker::new();
        tracker.complete("missing");
        assert!(tracker.get("missing").is_none());
    }

    #[test]
    fn test_finished_runs_expire() {
        let tracker = AnalysisTracker::with_retention(Duration::from_secs(60));
        let done = tracker.create(AnalysisKind::Cyfi);
        let running = tracker.create(AnalysisKind::WaterQuality);
        tracker.set_progress(&running, 10);
        tracker.complete(&done);

        // Nothing is old enough yet.
        assert_eq!(tracker.prune(), 0);
        assert_eq!(tracker.len(), 2);

        let long_ago = chrono::Utc::now() - chrono::Duration::hours(2);
        tracker.runs.write().get_mut(&done).unwrap().completed_at = Some(long_ago);
        tracker.runs.write().get_mut(&running).unwrap().created_at = long_ago;

        // Registering a new run sweeps the expired one but keeps the live run.
        let fresh = tracker.create(AnalysisKind::Cyfi);
        assert!(tracker.get(&done).is_none());
        assert!(tracker.get(&running).is_some());
        assert!(tracker.get(&fresh).is_some());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = AnalysisTracker::new();
        let other = tracker.clone();
        let id = tracker.create(AnalysisKind::Cyfi);
        assert!(other.get(&id).is_some());
    }
}
