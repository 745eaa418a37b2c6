use async_trait::async_trait;
use serde::Deserialize;

pub mod ollama;
pub mod scripted;

pub use ollama::OllamaBackend;
pub use scripted::ScriptedBackend;

/// Failure of a single text-generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// HTTP status when the server answered, `None` for network/timeout/decode failures
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "backend returned HTTP {}: {}", code, self.message),
            None => write!(f, "backend unavailable: {}", self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// Step-local generation parameters
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub stop: Vec<String>,
    /// Overrides the backend's default model for this step
    pub model: Option<String>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Text-generation service invoked once per pipeline step.
///
/// Implementations carry no pipeline logic. A call either yields the raw
/// model text or a [`BackendError`].
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, BackendError>;

    /// Short identifier used in logs
    fn describe(&self) -> String {
        "backend".to_string()
    }
}
