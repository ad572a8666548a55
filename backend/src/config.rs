//! Gateway configuration file support.
//!
//! Settings are read from a `waterwatch.toml` file and then overridden by
//! environment variables. Every field has a default so an empty file (or no
//! file at all) yields a working local setup.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("No waterwatch.toml found in standard locations")]
    NotFound,
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterWatchConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where the analysis scripts live and how they are run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_water_quality_script")]
    pub water_quality_script: PathBuf,
    #[serde(default = "default_cyfi_script")]
    pub cyfi_script: PathBuf,
    /// Generated images and data files; served under `/results`.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Scratch directory for per-run config files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sampling grid passed to the CyFi analysis, in degrees.
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
    /// How long finished runs stay pollable.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            python: default_python(),
            water_quality_script: default_water_quality_script(),
            cyfi_script: default_cyfi_script(),
            results_dir: default_results_dir(),
            work_dir: default_work_dir(),
            timeout_secs: default_timeout_secs(),
            grid_size: default_grid_size(),
            retention_secs: default_retention_secs(),
        }
    }
}

impl AnalysisSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_python() -> String {
    let python = if cfg!(windows) { "python" } else { "python3" };
    python.to_string()
}

fn default_water_quality_script() -> PathBuf {
    PathBuf::from("GIS/water_quality/water_quality_monitor.py")
}

fn default_cyfi_script() -> PathBuf {
    PathBuf::from("GIS/cyfi/core/analyze_cli.py")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("public/results")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_grid_size() -> f64 {
    0.001
}

fn default_retention_secs() -> u64 {
    3600
}

impl WaterWatchConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from the first `waterwatch.toml` found in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("waterwatch.toml"),
            PathBuf::from("backend/waterwatch.toml"),
            PathBuf::from("../waterwatch.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Apply `HOST`, `PORT`, `WATERWATCH_PYTHON`, `WATERWATCH_RESULTS_DIR` and
    /// `WATERWATCH_TIMEOUT_SECS` overrides.
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Ok(python) = env::var("WATERWATCH_PYTHON") {
            self.analysis.python = python;
        }
        if let Ok(dir) = env::var("WATERWATCH_RESULTS_DIR") {
            self.analysis.results_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = env::var("WATERWATCH_TIMEOUT_SECS") {
            self.analysis.timeout_secs = parse_env("WATERWATCH_TIMEOUT_SECS", &secs)?;
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}
