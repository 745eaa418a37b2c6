use std::collections::HashSet;

use crate::pipeline::error::PipelineError;
use crate::pipeline::step::Step;
use crate::template::is_identifier;

/// An ordered, validated sequence of steps with declared inputs and outputs.
///
/// Immutable once built. A `Pipeline` can be shared between concurrent runs;
/// every run keeps its own bindings and transcripts.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    description: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn declared_inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn declared_outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Memory keys used by any step, in first-use order
    pub fn memory_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for key in self.steps.iter().filter_map(Step::memory_key) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    description: Option<String>,
    inputs: Vec<String>,
    outputs: Option<Vec<String>>,
    steps: Vec<Step>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            inputs: Vec::new(),
            outputs: None,
            steps: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    pub fn inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    /// Variables returned to the caller. When never set, every step output
    /// is returned in production order.
    pub fn outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs
            .get_or_insert_with(Vec::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Validate ordering, uniqueness and outputs, then freeze the pipeline.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let mut available: HashSet<&str> = HashSet::new();

        for input in &self.inputs {
            if !is_identifier(input) {
                return Err(PipelineError::InvalidStep {
                    step: self.name.clone(),
                    detail: format!("declared input '{}' is not a valid variable name", input),
                });
            }
            if !available.insert(input.as_str()) {
                return Err(PipelineError::DuplicateBinding {
                    step: None,
                    variable: input.clone(),
                });
            }
        }

        let mut produced: Vec<String> = Vec::new();
        for (idx, step) in self.steps.iter().enumerate() {
            for input in step.inputs() {
                if !available.contains(input.as_str()) {
                    let detail = if step.output_keys().contains(input)
                        || self.steps[idx + 1..]
                            .iter()
                            .any(|later| later.output_keys().contains(input))
                    {
                        format!("input '{}' is only produced by this or a later step", input)
                    } else {
                        format!(
                            "input '{}' is neither a declared input nor an output of an earlier step",
                            input
                        )
                    };
                    return Err(PipelineError::TemplateMismatch {
                        step: step.name().to_string(),
                        detail,
                    });
                }
            }
            for key in step.output_keys() {
                if !available.insert(key.as_str()) {
                    return Err(PipelineError::DuplicateBinding {
                        step: Some(step.name().to_string()),
                        variable: key.clone(),
                    });
                }
                produced.push(key.clone());
            }
        }

        let requested = self.outputs.unwrap_or(produced);
        let mut outputs: Vec<String> = Vec::with_capacity(requested.len());
        for name in requested {
            if !available.contains(name.as_str()) {
                return Err(PipelineError::UndeclaredOutput { variable: name });
            }
            if !outputs.contains(&name) {
                outputs.push(name);
            }
        }

        tracing::debug!(
            pipeline = self.name.as_str(),
            steps = self.steps.len(),
            "Pipeline validated"
        );

        Ok(Pipeline {
            description: self.description.unwrap_or_else(|| "Unnamed pipeline".to_string()),
            name: self.name,
            inputs: self.inputs,
            outputs,
            steps: self.steps,
        })
    }
}
