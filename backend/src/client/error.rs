//! Client error types.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
    },
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}
