#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::TempDir;
use waterwatch::config::AnalysisSettings;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Temporary directory holding stand-in analysis scripts, run with `sh`.
pub struct ScriptSandbox {
    pub dir: TempDir,
}

impl ScriptSandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, body).expect("write script");
        path
    }

    pub fn results_dir(&self) -> PathBuf {
        self.path("results")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.path("work")
    }

    /// Stand-in interpreter: runs scripts with `sh`, and answers the inline
    /// `-c` error image call by writing the image (or failing, like an
    /// interpreter without matplotlib).
    #[cfg(unix)]
    pub fn write_interpreter(&self, renders_error_images: bool) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let error_image = if renders_error_images {
            "printf 'png' > \"$4\"\n  exit 0"
        } else {
            "echo \"No module named 'matplotlib'\" >&2\n  exit 1"
        };
        let body = format!(
            "#!/bin/sh\nif [ \"$1\" = \"-c\" ]; then\n  {}\nfi\nexec sh \"$@\"\n",
            error_image
        );
        let path = self.write_script("python", &body);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make interpreter executable");
        path
    }

    pub fn settings(&self, water_quality_script: PathBuf, cyfi_script: PathBuf) -> AnalysisSettings {
        #[cfg(unix)]
        let python = self.write_interpreter(false).display().to_string();
        #[cfg(not(unix))]
        let python = "sh".to_string();

        AnalysisSettings {
            python,
            water_quality_script,
            cyfi_script,
            results_dir: self.results_dir(),
            work_dir: self.work_dir(),
            timeout_secs: 30,
            grid_size: 0.001,
            retention_secs: 3600,
        }
    }
}

/// Water quality stand-in: `$2` config, `$4` image, `$6` data file. Writes
/// the data file in the same shape as `water_quality_monitor.py`.
pub const WATER_QUALITY_OK: &str = r#"
cp "$2" "$(dirname "$6")/seen_config.json"
printf 'png' > "$4"
cat > "$6" <<'JSON'
{"ndwi_analysis": {"waterCoverage": 42.5, "clearWater": 30.0, "moderateQuality": 10.0, "algalPresence": 2.5},
 "ml_analysis": {"waterCoverage": 40.0, "clearWater": 28.0, "moderateQuality": 9.0, "algalPresence": 3.0},
 "mlAnalysisAvailable": true, "rgbImagePath": "rgb.png",
 "dataSource": "sentinel2", "trueColorAvailable": true, "waterDetectionAvailable": true}
JSON
echo "Water quality analysis completed successfully."
"#;

/// Older data file layout with the NDWI metrics at the top level.
pub const WATER_QUALITY_FLAT: &str = r#"
printf 'png' > "$4"
cat > "$6" <<'JSON'
{"waterCoverage": 12.5, "clearWater": 8.0, "moderateQuality": 3.0, "algalPresence": 1.5,
 "ml_analysis": null, "mlAnalysisAvailable": false, "dataSource": "landsat8"}
JSON
"#;

/// Exits cleanly but the data file carries no metrics.
pub const WATER_QUALITY_NO_METRICS: &str = r#"
printf 'png' > "$4"
echo '{"dataSource": "sentinel2", "mlAnalysisAvailable": false}' > "$6"
"#;

/// Writes an error image and error data, then exits 1 like the real script.
pub const WATER_QUALITY_ERROR: &str = r#"
printf 'png' > "$4"
cat > "$6" <<'JSON'
{"waterCoverage": 0, "clearWater": 0, "moderateQuality": 0, "algalPresence": 0,
 "error": "No cloud-free imagery available"}
JSON
echo "Error in water quality analysis" >&2
exit 1
"#;

pub const WATER_QUALITY_SILENT: &str = r#"
echo "nothing to see" >&2
exit 0
"#;

pub const SLOW_SCRIPT: &str = "sleep 5\n";

pub const CYFI_OK: &str = r#"
cat <<'JSON'
{"timestamp": "2025-06-01T12:00:00", "predictions": {"density_cells_per_ml": 15000.0, "severity": "moderate", "confidence": 0.8}, "metadata": {"date_analyzed": "2025-06-01", "points_analyzed": 9, "grid_size": 0.001}}
JSON
"#;

pub const CYFI_FAIL: &str = r#"
echo '{"error": true, "message": "boom"}' >&2
exit 1
"#;

pub const CYFI_GARBAGE: &str = "echo 'not json'\n";
