//! Exporter error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Exporter configuration error: {0}")]
    Config(String),

    #[error("Export request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Export endpoint returned unexpected status code: {status}")]
    Http { status: u16 },
}

impl ExportError {
    /// Whether the sender should be told to retry later
    pub fn is_retryable(&self) -> bool {
        match self {
            ExportError::Config(_) => false,
            ExportError::Transport(_) => true,
            ExportError::Http { status } => *status == 429 || *status >= 500,
        }
    }
}
