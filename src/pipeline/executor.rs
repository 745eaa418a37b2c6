use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::backend::TextBackend;
use crate::pipeline::bindings::Bindings;
use crate::pipeline::definition::Pipeline;
use crate::pipeline::error::PipelineError;
use crate::pipeline::memory::{Exchange, Transcripts};
use crate::pipeline::step::Step;

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunOutput {
    /// Bindings restricted to the pipeline's declared outputs
    pub outputs: Bindings,
    /// Transcripts recorded by steps with a memory key
    pub transcripts: Transcripts,
}

impl RunOutput {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.outputs.get(key)
    }

    pub fn transcript(&self, memory_key: &str) -> &[Exchange] {
        self.transcripts.get(memory_key)
    }
}

/// Runs pipelines against a text-generation backend.
///
/// The executor owns no pipeline state. It only remembers the transcripts of
/// the most recent run so callers can query them afterwards. A run that fails
/// leaves them empty.
pub struct PipelineExecutor {
    backend: Arc<dyn TextBackend>,
    last_transcripts: Mutex<Transcripts>,
}

impl PipelineExecutor {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        Self {
            backend,
            last_transcripts: Mutex::new(Transcripts::new()),
        }
    }


    /// Execute a pipeline from initial bindings
    ///
    /// # Flow
    /// 1. Check the initial bindings against the declared inputs
    /// 2. For each step: render, call the backend, bind outputs, record memory
    /// 3. Return the declared outputs and transcripts
    ///
    /// Any error aborts the run; nothing produced so far is returned.
    #[tracing::instrument(skip_all, fields(pipeline = pipeline.name(), steps = pipeline.steps().len()))]
    pub async fn run(&self, pipeline: &Pipeline, initial: Bindings) -> Result<RunOutput, PipelineError> {
        let started = Instant::now();
        tracing::info!("Executing pipeline '{}' on {}", pipeline.name(), self.backend.describe());
        self.store_transcripts(Transcripts::new());

        check_bindings(pipeline, &initial)?;

        let mut bindings = initial;
        let mut transcripts = Transcripts::new();

        for (idx, step) in pipeline.steps().iter().enumerate() {
            self.run_step(idx + 1, step, &mut bindings, &mut transcripts).await?;
        }

        let outputs = bindings.select(pipeline.declared_outputs());

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline execution completed successfully"
        );

        self.store_transcripts(transcripts.clone());

        Ok(RunOutput { outputs, transcripts })
    }

    /// Transcript for `memory_key` from the most recent run. Empty when that
    /// run failed.
    pub fn transcript(&self, memory_key: &str) -> Vec<Exchange> {
        self.last_transcripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(memory_key)
            .to_vec()
    }

    fn store_transcripts(&self, transcripts: Transcripts) {
        *self
            .last_transcripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = transcripts;
    }

    async fn run_step(
        &self,
        step_index: usize,
        step: &Step,
        bindings: &mut Bindings,
        transcripts: &mut Transcripts,
    ) -> Result<(), PipelineError> {
        tracing::debug!(step_index, step = step.name(), "Running step");

        for input in step.inputs() {
            if !bindings.contains(input) {
                tracing::error!(step = step.name(), input = input.as_str(), "Input unbound at run time");
                return Err(PipelineError::UnresolvedInput {
                    step: step.name().to_string(),
                    variable: input.clone(),
                });
            }
        }

        let prompt = step
            .template()
            .render_with(|name| bindings.get(name))
            .map_err(|_| PipelineError::UnresolvedInput {
                step: step.name().to_string(),
                variable: step
                    .inputs()
                    .iter()
                    .find(|i| !bindings.contains(i))
                    .cloned()
                    .unwrap_or_default(),
            })?;
        tracing::trace!(step = step.name(), prompt = prompt.as_str(), "Rendered prompt");

        let raw = self
            .backend
            .generate(&prompt, step.options())
            .await
            .map_err(|source| {
                tracing::warn!(step_index, step = step.name(), "Backend call failed: {}", source);
                PipelineError::Backend {
                    step_index,
                    step: step.name().to_string(),
                    source,
                }
            })?;
        tracing::debug!(
            step = step.name(),
            prompt_len = prompt.len(),
            response_len = raw.len(),
            "Step finished"
        );

        let fields = step
            .parser()
            .parse(&raw, step.output_keys().len())
            .map_err(|found| PipelineError::OutputParse {
                step: step.name().to_string(),
                expected: step.output_keys().len(),
                found,
            })?;

        for (key, value) in step.output_keys().iter().zip(fields) {
            bindings
                .insert(key.clone(), value)
                .map_err(|variable| PipelineError::DuplicateBinding {
                    step: Some(step.name().to_string()),
                    variable,
                })?;
        }

        if let Some(memory_key) = step.memory_key() {
            transcripts.record(memory_key, prompt, raw);
        }
        Ok(())
    }
}

/// Initial bindings must match the declared inputs exactly, each bound once
fn check_bindings(pipeline: &Pipeline, initial: &Bindings) -> Result<(), PipelineError> {
    let declared = pipeline.declared_inputs();
    let missing: Vec<String> = declared
        .iter()
        .filter(|name| !initial.contains(name))
        .cloned()
        .collect();
    let unexpected: Vec<String> = initial
        .keys()
        .filter(|key| !declared.iter().any(|d| d == *key))
        .map(String::from)
        .collect();
    let duplicated = initial.duplicates().to_vec();

    if missing.is_empty() && unexpected.is_empty() && duplicated.is_empty() {
        return Ok(());
    }
    tracing::warn!(?missing, ?unexpected, ?duplicated, "Initial bindings do not match declared inputs");
    Err(PipelineError::BindingMismatch {
        missing,
        unexpected,
        duplicated,
    })
}
