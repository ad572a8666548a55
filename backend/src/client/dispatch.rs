//! HTTP dispatch of analysis requests.

use std::env;
use std::time::Duration;

use log::debug;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ClientError;
use super::session::SessionContext;
use crate::models::bbox::BoundingBox;
use crate::models::cyfi::{CyFiRequestBody, CyFiResult};
use crate::models::request::AnalysisRequest;
use crate::models::result::AnalysisOutcome;
use crate::services::tracker::StatusReport;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
/// Ceiling for one analysis round trip; the scripts can be slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
/// CyFi sampling grid sent when the caller does not pick one.
pub const DEFAULT_GRID_SIZE: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults, with the base URL taken from `WATERWATCH_API_URL` when set.
    pub fn from_env() -> Self {
        match env::var("WATERWATCH_API_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl AnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(builder: RequestBuilder, session: &SessionContext) -> RequestBuilder {
        match session.bearer_header() {
            Some(header) => builder.header(AUTHORIZATION, header),
            None => builder,
        }
    }

    fn hard_failure(&self, err: reqwest::Error) -> AnalysisOutcome {
        match ClientError::from_reqwest(err, self.config.timeout) {
            ClientError::Timeout(timeout) => AnalysisOutcome::hard(format!(
                "Analysis request timed out after {} seconds",
                timeout.as_secs()
            )),
            other => AnalysisOutcome::hard(format!("Failed to analyze site: {}", other)),
        }
    }

    /// Submit a water quality analysis.
    ///
    /// Never fails: transport problems become
    /// [`AnalysisOutcome::HardFailure`], and the body decides between success
    /// and soft failure whatever the HTTP status.
    pub async fn submit(
        &self,
        session: &SessionContext,
        request: &AnalysisRequest,
    ) -> AnalysisOutcome {
        debug!(
            "submitting analysis for {} ({})",
            request.bbox, request.data_source
        );

        let builder = self
            .http
            .post(self.url("water-quality"))
            .json(&request.to_body());
        let response = match Self::authorize(builder, session).send().await {
            Ok(response) => response,
            Err(e) => return self.hard_failure(e),
        };

        let status = response.status();
        match response.json::<Value>().await {
            Ok(body) => {
                debug!("analysis response status {}", status);
                AnalysisOutcome::from_body(body)
            }
            Err(e) => self.hard_failure(e),
        }
    }

    /// Run a CyFi algal-bloom analysis over `bbox` for `date`.
    pub async fn analyze_cyfi(
        &self,
        session: &SessionContext,
        bbox: BoundingBox,
        date: &str,
    ) -> Result<CyFiResult, ClientError> {
        let body = CyFiRequestBody {
            bbox: Some(bbox),
            date: Some(date.to_string()),
            grid_size: Some(DEFAULT_GRID_SIZE),
        };
        let builder = self.http.post(self.url("cyfi/analyze")).json(&body);
        let response = Self::authorize(builder, session)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.config.timeout))?;
        self.decode(response, "Failed to analyze area").await
    }

    /// Poll the status of a tracked analysis.
    pub async fn analysis_status(
        &self,
        session: &SessionContext,
        analysis_id: &str,
    ) -> Result<StatusReport, ClientError> {
        let builder = self.http.get(self.url(&format!("analyses/{}", analysis_id)));
        let response = Self::authorize(builder, session)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.config.timeout))?;
        self.decode(response, "Failed to check analysis status").await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: Response,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string();
            let details = body
                .get("details")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
                details,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.config.timeout))
    }
}
