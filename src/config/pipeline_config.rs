use serde::Deserialize;
use std::collections::BTreeMap;

use crate::backend::GenerationOptions;
use crate::pipeline::{OutputParser, Pipeline, PipelineError, Step};

/// A pipeline as declared under `[pipelines.<name>]`
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub description: Option<String>,
    pub inputs: Vec<String>,
    /// Defaults to every step output when omitted
    pub outputs: Option<Vec<String>>,
    pub steps: Vec<StepConfig>,
}

/// One `[[pipelines.<name>.steps]]` entry
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StepConfig {
    pub name: Option<String>,
    pub template: String,
    /// Defaults to the template's placeholders
    pub inputs: Option<Vec<String>>,
    pub output_key: Option<String>,
    pub output_keys: Vec<String>,
    /// Splits the response into `output_keys`
    pub separator: Option<String>,
    pub memory_key: Option<String>,
    pub temperature: Option<f32>,
    pub stop: Vec<String>,
    pub model: Option<String>,
    pub partials: BTreeMap<String, String>,
}

impl StepConfig {
    pub fn to_step(&self) -> Result<Step, PipelineError> {
        let mut builder = Step::builder(self.template.clone()).options(GenerationOptions {
            temperature: self.temperature,
            stop: self.stop.clone(),
            model: self.model.clone(),
        });

        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if let Some(inputs) = &self.inputs {
            builder = builder.inputs(inputs.iter().cloned());
        }
        if let Some(key) = &self.output_key {
            builder = builder.output_key(key.clone());
        }
        builder = builder.output_keys(self.output_keys.iter().cloned());
        if let Some(separator) = &self.separator {
            builder = builder.parser(OutputParser::Delimited(separator.clone()));
        }
        if let Some(key) = &self.memory_key {
            builder = builder.memory_key(key.clone());
        }
        for (name, value) in &self.partials {
            builder = builder.partial(name.clone(), value.clone());
        }

        builder.build()
    }
}

impl PipelineConfig {
    /// Build and validate the pipeline this entry describes
    pub fn to_pipeline(&self, name: &str) -> Result<Pipeline, PipelineError> {
        let mut builder = Pipeline::builder(name).inputs(self.inputs.iter().cloned());
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        for step in &self.steps {
            builder = builder.step(step.to_step()?);
        }
        if let Some(outputs) = &self.outputs {
            builder = builder.outputs(outputs.iter().cloned());
        }
        builder.build()
    }
}
