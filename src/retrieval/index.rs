use async_trait::async_trait;
use ollama_client::OllamaClient;
use serde::Serialize;

use crate::backend::BackendError;
use crate::retrieval::document::Document;
use crate::retrieval::RetrievalError;

/// Turns text into a dense vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;
}

/// Embeddings served by Ollama's `/api/embeddings`
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    /// Uses the client's configured embedding model
    pub fn new(client: OllamaClient) -> Self {
        let model = client.config().embedding_model.clone();
        Self { client, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        self.client
            .embed(&self.model, text)
            .await
            .map_err(BackendError::from)
    }
}

/// A document returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// In-memory cosine-similarity index
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<(Document, Vec<f32>)>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed and index every document
    pub async fn build(embedder: &dyn Embedder, docs: Vec<Document>) -> Result<Self, RetrievalError> {
        let mut index = Self::new();
        index.add_documents(embedder, docs).await?;
        Ok(index)
    }

    pub async fn add_documents(
        &mut self,
        embedder: &dyn Embedder,
        docs: Vec<Document>,
    ) -> Result<(), RetrievalError> {
        for doc in docs {
            let vector = embedder.embed(&doc.content).await?;
            self.insert(doc, vector)?;
        }
        tracing::debug!("Vector index holds {} documents", self.entries.len());
        Ok(())
    }

    /// Insert a pre-computed embedding. All vectors must share one dimension.
    pub fn insert(&mut self, doc: Document, vector: Vec<f32>) -> Result<(), RetrievalError> {
        if vector.is_empty() {
            return Err(RetrievalError::EmptyEmbedding);
        }
        if let Some(expected) = self.dimension() {
            if vector.len() != expected {
                return Err(RetrievalError::DimensionMismatch {
                    expected,
                    found: vector.len(),
                });
            }
        }
        self.entries.push((doc, vector));
        Ok(())
    }

    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|(_, v)| v.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RetrievalError> {
        let vector = embedder.embed(query).await?;
        self.search_by_vector(&vector, k)
    }

    /// Top `k` documents by cosine similarity, best first. Equal scores keep
    /// insertion order; a zero-length vector scores 0.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>, RetrievalError> {
        if let Some(expected) = self.dimension() {
            if query.len() != expected {
                return Err(RetrievalError::DimensionMismatch {
                    expected,
                    found: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, v))| (i, cosine(query, v)))
            .collect();
        // stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredDocument {
                document: self.entries[i].0.clone(),
                score,
            })
            .collect())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts occurrences of a fixed vocabulary
    struct VocabEmbedder(&'static [&'static str]);

    #[async_trait]
    impl Embedder for VocabEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
            let text = text.to_lowercase();
            Ok(self.0.iter().map(|w| text.matches(w).count() as f32).collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, BackendError> {
            Err(BackendError::new(Some(404), "model \"nomic-embed-text\" not found"))
        }
    }

    const VOCAB: &[&str] = &["cat", "dog", "rust"];

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let embedder = VocabEmbedder(VOCAB);
        let docs = vec![
            Document::new("dogs and more dogs").with_metadata("source", "dogs.txt"),
            Document::new("rust borrow checker").with_metadata("source", "rust.txt"),
            Document::new("a cat sat").with_metadata("source", "cats.txt"),
        ];
        let index = VectorIndex::build(&embedder, docs).await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), Some(3));

        let hits = index.search(&embedder, "tell me about rust", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.source(), Some("rust.txt"));
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = VectorIndex::new();
        index.insert(Document::new("first"), vec![1.0, 0.0]).unwrap();
        index.insert(Document::new("second"), vec![2.0, 0.0]).unwrap();
        index.insert(Document::new("third"), vec![0.0, 1.0]).unwrap();

        let hits = index.search_by_vector(&[1.0, 0.0], 10).unwrap();
        let order: Vec<_> = hits.iter().map(|h| h.document.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = VectorIndex::new();
        index.insert(Document::new("a"), vec![1.0, 0.0]).unwrap();
        assert!(matches!(
            index.insert(Document::new("b"), vec![1.0]),
            Err(RetrievalError::DimensionMismatch { expected: 2, found: 1 })
        ));
        assert!(matches!(
            index.search_by_vector(&[1.0, 0.0, 0.0], 1),
            Err(RetrievalError::DimensionMismatch { expected: 2, found: 3 })
        ));
        assert!(matches!(
            index.insert(Document::new("c"), vec![]),
            Err(RetrievalError::EmptyEmbedding)
        ));
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = VectorIndex::new();
        assert!(index.is_empty());
        assert!(index.search_by_vector(&[1.0], 5).unwrap().is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let err = VectorIndex::build(&FailingEmbedder, vec![Document::new("x")])
            .await
            .unwrap_err();
        match err {
            RetrievalError::Embedding(e) => assert_eq!(e.status, Some(404)),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
