use thiserror::Error;

use crate::backend::BackendError;
use crate::pipeline::PipelineError;

pub mod document;
pub mod index;
pub mod qa;
pub mod splitter;

pub use document::Document;
pub use index::{Embedder, OllamaEmbedder, ScoredDocument, VectorIndex};
pub use qa::{QaAnswer, RetrievalQa, STUFF_PROMPT};
pub use splitter::TextSplitter;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] BackendError),
    #[error("Embedding has {found} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Embedding service returned an empty vector")]
    EmptyEmbedding,
    #[error("No documents to search")]
    EmptyIndex,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
