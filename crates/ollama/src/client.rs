use reqwest::Client;

use crate::config::OllamaConfig;
use crate::error::{OllamaError, Result};
use crate::types::{EmbeddingRequest, EmbeddingResponse, GenerateRequest, GenerateResponse};

/// Async client for one Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a client from a validated config
    pub fn new(config: OllamaConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Run a single non-streaming generation.
    ///
    /// Any non-2xx status is returned as [`OllamaError::Status`] with the raw
    /// body, so callers can surface it verbatim.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.config.endpoint("/api/generate");
        tracing::debug!(
            model = request.model.as_str(),
            prompt_len = request.prompt.len(),
            "POST {}",
            url
        );

        let body = self.post_json(&url, request).await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            response_len = parsed.response.len(),
            done_reason = parsed.done_reason.as_deref().unwrap_or(""),
            "generation finished"
        );
        Ok(parsed)
    }

    /// Embed a single text with the given model
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = self.config.endpoint("/api/embeddings");
        let request = EmbeddingRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };
        tracing::debug!(model, text_len = text.len(), "POST {}", url);

        let body = self.post_json(&url, &request).await?;
        let parsed: EmbeddingResponse = serde_json::from_str(&body)?;
        Ok(parsed.embedding)
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<String> {
        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            tracing::warn!("Ollama request to {} failed with HTTP {}", url, status.as_u16());
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}
