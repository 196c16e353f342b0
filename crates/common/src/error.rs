//! Unified error type for the sailing-safety service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout, network failure or non-2xx from a forecast endpoint.
    /// The message is already localized for end users.
    #[error("{message} ({endpoint})")]
    UpstreamUnavailable { endpoint: String, message: String },

    #[error("Data prakiraan tidak tersedia untuk penilaian keselamatan")]
    MissingForecast,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures caused by the upstream providers rather than by the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::UpstreamUnavailable { .. } | Error::Http(_))
    }
}
