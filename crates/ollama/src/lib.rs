//! Ollama HTTP client
//!
//! A thin async wrapper over the two endpoints prompt pipelines need:
//! non-streaming text generation (`/api/generate`) and embeddings
//! (`/api/embeddings`). The client carries no pipeline logic; callers decide
//! what to send and how to interpret failures.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use client::OllamaClient;
pub use config::OllamaConfig;
pub use error::{OllamaError, Result};
pub use types::{EmbeddingRequest, EmbeddingResponse, GenerateOptions, GenerateRequest, GenerateResponse};

/// Default address of a locally running Ollama server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default generation model
pub const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
