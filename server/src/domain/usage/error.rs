//! Usage oracle error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Usage oracle configuration error: {0}")]
    Config(String),

    #[error("Usage oracle request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Usage oracle returned unexpected status code: {status}")]
    Http { status: u16 },

    #[error("Usage oracle response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl OracleError {
    /// Short label used as a structured log/telemetry field
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::Config(_) => "config",
            OracleError::Transport(_) => "transport",
            OracleError::Http { .. } => "http",
            OracleError::Decode(_) => "decode",
        }
    }
}
