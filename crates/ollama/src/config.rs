//! Configuration for the Ollama client

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{OllamaError, Result};
use crate::{DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL};

/// Connection and model settings for an Ollama server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL, without a trailing `/api`
    pub base_url: String,

    /// Model used for text generation unless a step overrides it
    pub model: String,

    /// Model used for embeddings
    pub embedding_model: String,

    /// Default sampling temperature; `None` leaves it to the server
    pub temperature: Option<f32>,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: None,
            timeout_ms: 120_000,
        }
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(OllamaError::config("base_url must not be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(OllamaError::config(format!(
                "base_url '{}' must start with http:// or https://",
                base
            )));
        }
        if self.model.trim().is_empty() {
            return Err(OllamaError::config("model must not be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(OllamaError::config("timeout_ms must be greater than zero"));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(OllamaError::config(format!(
                    "temperature {} is outside 0.0..=2.0",
                    t
                )));
            }
        }
        Ok(())
    }

    /// Get the request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Join an API path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}
