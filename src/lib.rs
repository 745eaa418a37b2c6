pub mod backend;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod retrieval;
pub mod template;

use std::sync::Arc;

use crate::backend::OllamaBackend;
use crate::config::Config;
use crate::pipeline::PipelineExecutor;

pub use backend::{BackendError, GenerationOptions, TextBackend};
pub use pipeline::{Bindings, Pipeline, PipelineError, RunOutput, Step};
pub use template::PromptTemplate;

/// Executor talking to the Ollama server described by `config.backend`
pub fn ollama_executor(config: &Config) -> Result<PipelineExecutor, ollama_client::OllamaError> {
    let backend = OllamaBackend::new(config.backend.clone())?;
    tracing::info!("🔧 Using {}", backend.describe());
    Ok(PipelineExecutor::new(Arc::new(backend)))
}
