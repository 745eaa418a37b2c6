use serde::Serialize;

use crate::backend::GenerationOptions;
use crate::pipeline::{Bindings, Pipeline, PipelineError, PipelineExecutor, Step};
use crate::retrieval::index::{Embedder, ScoredDocument, VectorIndex};
use crate::retrieval::RetrievalError;

/// Default prompt for answering from retrieved context
pub const STUFF_PROMPT: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n\
{context}\n\nQuestion: {question}\nHelpful Answer:";

#[derive(Debug, Clone, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub sources: Vec<ScoredDocument>,
}

/// Question answering over a [`VectorIndex`].
///
/// The top `k` chunks are "stuffed" into one prompt, joined by blank lines,
/// and answered by a single-step pipeline with inputs `context` and
/// `question` and output `answer`.
#[derive(Debug, Clone)]
pub struct RetrievalQa {
    pipeline: Pipeline,
    top_k: usize,
}

impl RetrievalQa {
    pub fn new(top_k: usize) -> Result<Self, PipelineError> {
        Self::with_prompt(STUFF_PROMPT, top_k, GenerationOptions::default())
    }

    /// `prompt` must use exactly the placeholders `{context}` and `{question}`
    pub fn with_prompt(
        prompt: &str,
        top_k: usize,
        options: GenerationOptions,
    ) -> Result<Self, PipelineError> {
        let step = Step::builder(prompt)
            .name("answer")
            .inputs(["context", "question"])
            .output_key("answer")
            .options(options)
            .build()?;
        let pipeline = Pipeline::builder("retrieval_qa")
            .description("Answer a question from retrieved context")
            .inputs(["context", "question"])
            .output("answer")
            .step(step)
            .build()?;
        Ok(Self {
            pipeline,
            top_k: top_k.max(1),
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[tracing::instrument(skip_all, fields(top_k = self.top_k))]
    pub async fn ask(
        &self,
        executor: &PipelineExecutor,
        index: &VectorIndex,
        embedder: &dyn Embedder,
        question: &str,
    ) -> Result<QaAnswer, RetrievalError> {
        if index.is_empty() {
            return Err(RetrievalError::EmptyIndex);
        }
        let sources = index.search(embedder, question, self.top_k).await?;
        tracing::debug!("Retrieved {} chunks", sources.len());

        let context = sources
            .iter()
            .map(|s| s.document.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let bindings = Bindings::new()
            .with("context", context)
            .with("question", question);

        let output = executor.run(&self.pipeline, bindings).await?;
        let answer = output.get("answer").unwrap_or_default().to_string();
        Ok(QaAnswer { answer, sources })
    }
}
