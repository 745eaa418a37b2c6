use async_trait::async_trait;
use ollama_client::{GenerateOptions, GenerateRequest, OllamaClient, OllamaConfig, OllamaError};

use super::{BackendError, GenerationOptions, TextBackend};

/// [`TextBackend`] backed by an Ollama server's `/api/generate`
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: OllamaClient,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, OllamaError> {
        Ok(Self {
            client: OllamaClient::new(config)?,
        })
    }

    fn build_request(&self, prompt: &str, options: &GenerationOptions) -> GenerateRequest {
        let config = self.client.config();
        let model = options.model.clone().unwrap_or_else(|| config.model.clone());
        GenerateRequest::new(model, prompt).with_options(GenerateOptions {
            temperature: options.temperature.or(config.temperature),
            stop: options.stop.clone(),
        })
    }
}

impl From<OllamaError> for BackendError {
    fn from(err: OllamaError) -> Self {
        match err {
            // Surface the server's body verbatim
            OllamaError::Status { status, body } => BackendError::new(Some(status), body),
            other => BackendError::new(other.status(), other.to_string()),
        }
    }
}

#[async_trait]
impl TextBackend for OllamaBackend {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, BackendError> {
        let request = self.build_request(prompt, options);
        let response = self.client.generate(&request).await?;
        Ok(response.response)
    }

    fn describe(&self) -> String {
        format!("ollama({} @ {})", self.client.config().model, self.client.config().base_url)
    }
}
