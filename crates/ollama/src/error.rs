//! Error types for Ollama requests

use thiserror::Error;

/// Result type alias for Ollama operations
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Error types that can occur while talking to an Ollama server
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode Ollama response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl OllamaError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status reported by the server, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            OllamaError::Status { status, .. } => Some(*status),
            OllamaError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error was a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, OllamaError::Http(err) if err.is_timeout())
    }
}
