//! Unified pipeline error types.

use thiserror::Error;

/// Top-level pipeline error.
///
/// Each variant is one failure class. Messages never contain credential
/// values: URLs are stripped from transport errors and secrets are only
/// ever formatted through [`crate::config::Secret`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Service unavailable after {attempts} attempts: {service}")]
    ServiceUnavailable { service: String, attempts: u32 },

    #[error("Chain rejected transaction {tx_hash}: {reason}")]
    ChainRejection { tx_hash: String, reason: String },
}

impl PipelineError {
    /// Process exit code for this failure class. Never 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Transport(_) => 3,
            Self::Data(_) => 4,
            Self::ServiceUnavailable { .. } => 5,
            Self::ChainRejection { .. } => 6,
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.into())
    }
}

/// Transport-layer errors (HTTP and JSON-RPC).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The URL may carry an API key in its query string.
        TransportError::Request(err.without_url())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
