//! Subprocess execution of the analysis scripts.
//!
//! The scripts are opaque: the water quality script reads a config file and
//! writes an image plus a JSON data file, the CyFi script takes its parameters
//! as one JSON argument and prints its result on stdout. [`PythonRunner`]
//! turns both into typed results; [`AnalysisRunner`] is the seam the HTTP
//! layer depends on.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::fs;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::config::AnalysisSettings;
use crate::models::cyfi::CyFiRequest;
use crate::models::request::AnalysisRequest;
use crate::models::result::{AnalysisFailure, AnalysisMetrics, AnalysisResponse, WaterQualityMetrics};

/// URL prefix under which the results directory is served.
pub const RESULTS_ROUTE: &str = "/results";

const WATER_QUALITY_FAILED: &str = "Failed to analyze water quality";

/// Upper bound for rendering the error image.
const ERROR_IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders `sys.argv[1]` as a text card into the PNG at `sys.argv[2]`.
const ERROR_IMAGE_SNIPPET: &str = r#"
import sys
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt
fig = plt.figure(figsize=(10, 6))
plt.text(0.5, 0.5, "Water Quality Analysis Error:\n\n" + sys.argv[1],
         ha="center", va="center", fontsize=12, wrap=True,
         bbox=dict(boxstyle="round", facecolor="white", alpha=0.8))
plt.axis("off")
plt.savefig(sys.argv[2], dpi=100, bbox_inches="tight")
plt.close(fig)
"#;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("analysis script not found at {}", .0.display())]
    ScriptNotFound(PathBuf),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("Python script execution timed out after {0} seconds")]
    Timeout(u64),
    #[error("Analysis failed")]
    ScriptFailed { code: Option<i32>, stderr: String },
    #[error("Failed to parse analysis results")]
    InvalidOutput(String),
}

#[async_trait]
pub trait AnalysisRunner: Send + Sync {
    /// Run the water quality analysis for a validated request.
    ///
    /// Analysis problems come back as `Ok(AnalysisResponse::Failure)`; `Err` is
    /// reserved for problems with the gateway itself.
    async fn run_water_quality(
        &self,
        analysis_id: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, RunnerError>;

    /// Run the CyFi analysis and return the script's JSON output.
    async fn run_cyfi(&self, request: &CyFiRequest) -> Result<Value, RunnerError>;
}

/// One metrics block as written by the script. Every field is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptMetrics {
    water_coverage: f64,
    clear_water: f64,
    moderate_quality: f64,
    algal_presence: f64,
}

impl From<ScriptMetrics> for WaterQualityMetrics {
    fn from(m: ScriptMetrics) -> Self {
        WaterQualityMetrics {
            water_coverage: m.water_coverage,
            clear_water: m.clear_water,
            moderate_quality: m.moderate_quality,
            algal_presence: m.algal_presence,
        }
    }
}

/// Fields written by the water quality script to its data file.
///
/// NDWI metrics normally sit under `ndwi_analysis`; older scripts wrote them
/// at the top level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptData {
    #[serde(rename = "ndwi_analysis", default)]
    ndwi_analysis: Option<ScriptMetrics>,
    #[serde(default)]
    water_coverage: Option<f64>,
    #[serde(default)]
    clear_water: Option<f64>,
    #[serde(default)]
    moderate_quality: Option<f64>,
    #[serde(default)]
    algal_presence: Option<f64>,
    #[serde(rename = "ml_analysis", default)]
    ml_analysis: Option<ScriptMetrics>,
    #[serde(default)]
    ml_analysis_available: Option<bool>,
    #[serde(default)]
    rgb_image_path: Option<String>,
    #[serde(default)]
    detailed_ndwi_path: Option<String>,
    #[serde(default)]
    data_source: Option<String>,
    #[serde(default)]
    true_color_available: Option<bool>,
    #[serde(default)]
    water_detection_available: Option<bool>,
    #[serde(default)]
    error: Option<Value>,
}

impl ScriptData {
    /// Nested block first, then the flat fields. `None` if neither is complete.
    fn take_ndwi(&mut self) -> Option<WaterQualityMetrics> {
        if let Some(nested) = self.ndwi_analysis.take() {
            return Some(nested.into());
        }
        Some(WaterQualityMetrics {
            water_coverage: self.water_coverage?,
            clear_water: self.clear_water?,
            moderate_quality: self.moderate_quality?,
            algal_presence: self.algal_presence?,
        })
    }
}

pub fn results_url(file_name: &str) -> String {
    format!("{}/{}", RESULTS_ROUTE, file_name)
}

/// Runs the analysis scripts with a configured interpreter.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    settings: AnalysisSettings,
}

impl PythonRunner {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout()
    }

    async fn run_script(&self, args: Vec<OsString>) -> Result<Output, RunnerError> {
        let mut command = Command::new(&self.settings.python);
        command
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        info!("Executing command: {} {:?}", self.settings.python, args);

        let output = tokio::time::timeout(self.timeout(), command.output())
            .await
            .map_err(|_| RunnerError::Timeout(self.timeout().as_secs()))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            info!("Python script output: {}", stdout.trim());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("Python script errors: {}", stderr.trim());
        }
        Ok(output)
    }

    fn ensure_script(path: &Path) -> Result<(), RunnerError> {
        if path.is_file() {
            Ok(())
        } else {
            error!("Analysis script not found at path: {}", path.display());
            Err(RunnerError::ScriptNotFound(path.to_path_buf()))
        }
    }

    /// Draw `message` into `error_<id>.png` with the configured interpreter.
    /// Best effort: any failure is logged and yields `None`.
    async fn render_error_image(&self, analysis_id: &str, message: &str) -> Option<String> {
        let file_name = format!("error_{}.png", analysis_id);
        let path = self.settings.results_dir.join(&file_name);

        let mut command = Command::new(&self.settings.python);
        command
            .arg("-c")
            .arg(ERROR_IMAGE_SNIPPET)
            .arg(message)
            .arg(&path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(ERROR_IMAGE_TIMEOUT, command.output()).await {
            Ok(Ok(output)) if output.status.success() => {}
            Ok(Ok(output)) => warn!(
                "Failed to create error image: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Ok(Err(e)) => warn!("Failed to create error image: {}", e),
            Err(_) => warn!("Failed to create error image: timed out"),
        }

        path.is_file().then(|| results_url(&file_name))
    }

    /// Turn the outcome of one water quality run into a response body.
    async fn interpret_water_quality(
        &self,
        analysis_id: &str,
        run: Result<Output, RunnerError>,
        image_path: &Path,
        data_path: &Path,
    ) -> AnalysisResponse {
        let image_name = format!("water_quality_{}.png", analysis_id);
        let diagnostic_image = || image_path.is_file().then(|| results_url(&image_name));

        let output = match run {
            Ok(output) => output,
            Err(e) => {
                error!("Error executing Python script: {}", e);
                let message = e.to_string();
                let mut failure =
                    AnalysisFailure::new(format!("{}: {}", WATER_QUALITY_FAILED, message));
                failure.image_url = match self.render_error_image(analysis_id, &message).await {
                    Some(url) => Some(url),
                    None => diagnostic_image(),
                };
                return AnalysisResponse::Failure(failure);
            }
        };

        let bytes = match fs::read(data_path).await {
            Ok(bytes) => bytes,
            Err(_) => {
                error!("Python script did not generate output data file");
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let details = if stderr.is_empty() {
                    String::from_utf8_lossy(&output.stdout).trim().to_string()
                } else {
                    stderr
                };
                let mut failure = AnalysisFailure::new(format!(
                    "{}: no output data generated",
                    WATER_QUALITY_FAILED
                ))
                .with_details(details);
                failure.image_url = diagnostic_image();
                return AnalysisResponse::Failure(failure);
            }
        };

        let mut data: ScriptData = match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(e) => {
                error!("Unreadable analysis data file: {}", e);
                return AnalysisResponse::Failure(AnalysisFailure::new(format!(
                    "{}: invalid output data: {}",
                    WATER_QUALITY_FAILED, e
                )));
            }
        };

        // The script writes its error data and error image before exiting
        // non-zero, so the data file decides even on a failed exit status.
        if let Some(err) = data.error.clone().filter(|e| !e.is_null()) {
            let message = match err {
                Value::String(message) => message,
                other => other.to_string(),
            };
            warn!("Water quality analysis error: {}", message);
            return AnalysisResponse::Failure(
                AnalysisFailure::new(message).with_image(results_url(&image_name)),
            );
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "unknown".to_string(), |c| c.to_string());
            error!("Python script exited with status {}", code);
            return AnalysisResponse::Failure(
                AnalysisFailure::new(format!(
                    "{}: script exited with status {}",
                    WATER_QUALITY_FAILED, code
                ))
                .with_details(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            );
        }

        let Some(ndwi_analysis) = data.take_ndwi() else {
            error!("Analysis data file has no NDWI metrics");
            return AnalysisResponse::Failure(AnalysisFailure::new(format!(
                "{}: output data has no NDWI metrics",
                WATER_QUALITY_FAILED
            )));
        };

        AnalysisResponse::Metrics(AnalysisMetrics {
            ndwi_analysis,
            ml_analysis: data.ml_analysis.map(Into::into),
            ml_analysis_available: data.ml_analysis_available.unwrap_or(false),
            image_url: results_url(&image_name),
            rgb_image_url: data
                .rgb_image_path
                .map(|_| results_url(&format!("water_quality_{}_rgb.png", analysis_id))),
            detailed_ndwi_url: data.detailed_ndwi_path.map(|_| {
                results_url(&format!("water_quality_{}_detailed_ndwi.png", analysis_id))
            }),
            data_source: data.data_source,
            true_color_available: data.true_color_available,
            water_detection_available: data.water_detection_available,
            analysis_id: None,
        })
    }
}

#[async_trait]
impl AnalysisRunner for PythonRunner {
    async fn run_water_quality(
        &self,
        analysis_id: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, RunnerError> {
        let script = &self.settings.water_quality_script;
        Self::ensure_script(script)?;

        fs::create_dir_all(&self.settings.results_dir).await?;
        fs::create_dir_all(&self.settings.work_dir).await?;

        let config_path = self
            .settings
            .work_dir
            .join(format!("config_{}.json", analysis_id));
        let image_path = self
            .settings
            .results_dir
            .join(format!("water_quality_{}.png", analysis_id));
        let data_path = self
            .settings
            .results_dir
            .join(format!("water_quality_{}.json", analysis_id));

        let config = json!({
            "bboxCoords": request.bbox.to_coords(),
            "timeInterval": request.time_interval.to_strings(),
            "dataSource": request.data_source.as_str(),
        });
        info!("Running analysis with parameters: {}", config);
        fs::write(&config_path, config.to_string()).await?;

        let args: Vec<OsString> = vec![
            script.into(),
            "--config".into(),
            config_path.clone().into(),
            "--output".into(),
            image_path.clone().into(),
            "--data".into(),
            data_path.clone().into(),
            "--debug".into(),
        ];
        let run = self.run_script(args).await;

        if let Err(e) = fs::remove_file(&config_path).await {
            warn!("Failed to remove {}: {}", config_path.display(), e);
        }

        Ok(self
            .interpret_water_quality(analysis_id, run, &image_path, &data_path)
            .await)
    }

    async fn run_cyfi(&self, request: &CyFiRequest) -> Result<Value, RunnerError> {
        let script = &self.settings.cyfi_script;
        Self::ensure_script(script)?;

        let payload = json!({
            "bbox": request.bbox,
            "date": request.date,
            "grid_size": request.grid_size.unwrap_or(self.settings.grid_size),
        });
        let output = self
            .run_script(vec![script.into(), payload.to_string().into()])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("CyFi process error: {}", stderr);
            return Err(RunnerError::ScriptFailed {
                code: output.status.code(),
                stderr,
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            error!("Failed to parse CyFi output: {}", e);
            RunnerError::InvalidOutput(e.to_string())
        })
    }
}
