use crate::backend::GenerationOptions;
use crate::pipeline::error::PipelineError;
use crate::pipeline::parser::OutputParser;
use crate::template::{is_identifier, PromptTemplate};

/// One prompt-render-and-model-call unit of a pipeline
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    inputs: Vec<String>,
    template: PromptTemplate,
    output_keys: Vec<String>,
    parser: OutputParser,
    options: GenerationOptions,
    memory_key: Option<String>,
}

impl Step {
    /// Start building a step from its template text
    pub fn builder(template: impl Into<String>) -> StepBuilder {
        StepBuilder::new(template)
    }

    /// Single-output step whose inputs are the template's placeholders
    pub fn new(template: impl Into<String>, output_key: impl Into<String>) -> Result<Self, PipelineError> {
        Self::builder(template).output_key(output_key).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn output_keys(&self) -> &[String] {
        &self.output_keys
    }

    pub fn parser(&self) -> &OutputParser {
        &self.parser
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn memory_key(&self) -> Option<&str> {
        self.memory_key.as_deref()
    }
}

/// Builder for [`Step`]. All checks run in [`StepBuilder::build`].
#[derive(Debug, Clone)]
pub struct StepBuilder {
    name: Option<String>,
    template: String,
    inputs: Option<Vec<String>>,
    partials: Vec<(String, String)>,
    output_keys: Vec<String>,
    parser: OutputParser,
    options: GenerationOptions,
    memory_key: Option<String>,
}

impl StepBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            name: None,
            template: template.into(),
            inputs: None,
            partials: Vec::new(),
            output_keys: Vec::new(),
            parser: OutputParser::Verbatim,
            options: GenerationOptions::default(),
            memory_key: None,
        }
    }

    /// Name used in logs and errors. Defaults to the first output key.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare the inputs explicitly. They must match the template's
    /// non-partial placeholders exactly. Without this call the placeholders
    /// themselves are used.
    pub fn inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = Some(inputs.into_iter().map(Into::into).collect());
        self
    }

    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.push((name.into(), value.into()));
        self
    }

    pub fn output_key(mut self, key: impl Into<String>) -> Self {
        self.output_keys.push(key.into());
        self
    }

    pub fn output_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn parser(mut self, parser: OutputParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn stop(mut self, stop: impl Into<String>) -> Self {
        self.options.stop.push(stop.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    pub fn memory_key(mut self, key: impl Into<String>) -> Self {
        self.memory_key = Some(key.into());
        self
    }

    pub fn build(self) -> Result<Step, PipelineError> {
        let name = match (&self.name, self.output_keys.first()) {
            (Some(name), _) => name.clone(),
            (None, Some(first)) => first.clone(),
            (None, None) => "<unnamed>".to_string(),
        };
        let invalid = |detail: String| PipelineError::InvalidStep {
            step: name.clone(),
            detail,
        };

        if name.trim().is_empty() {
            return Err(invalid("step name must not be empty".to_string()));
        }

        // Outputs
        if self.output_keys.is_empty() {
            return Err(invalid("at least one output key is required".to_string()));
        }
        for (i, key) in self.output_keys.iter().enumerate() {
            if !is_identifier(key) {
                return Err(invalid(format!("output key '{}' is not a valid variable name", key)));
            }
            if self.output_keys[..i].contains(key) {
                return Err(PipelineError::DuplicateBinding {
                    step: Some(name.clone()),
                    variable: key.clone(),
                });
            }
        }
        if self.parser == OutputParser::Verbatim && self.output_keys.len() != 1 {
            return Err(invalid(format!(
                "{} output keys need an explicit parser; verbatim binds exactly one",
                self.output_keys.len()
            )));
        }
        if let OutputParser::Delimited(separator) = &self.parser {
            if separator.is_empty() {
                return Err(invalid("delimited parser needs a non-empty separator".to_string()));
            }
        }
        if let Some(key) = &self.memory_key {
            if key.trim().is_empty() {
                return Err(invalid("memory key must not be empty".to_string()));
            }
        }

        // Template
        let mut template = PromptTemplate::parse(self.template).map_err(|source| {
            PipelineError::InvalidTemplate {
                step: name.clone(),
                source,
            }
        })?;
        for (key, value) in self.partials {
            template = template
                .with_partial(key, value)
                .map_err(|source| PipelineError::InvalidTemplate {
                    step: name.clone(),
                    source,
                })?;
        }
        let placeholders: Vec<String> = template.variables().into_iter().map(String::from).collect();

        let inputs = match self.inputs {
            None => placeholders,
            Some(declared) => {
                for (i, input) in declared.iter().enumerate() {
                    if declared[..i].contains(input) {
                        return Err(invalid(format!("input '{}' is declared twice", input)));
                    }
                }
                let undeclared: Vec<&String> =
                    placeholders.iter().filter(|p| !declared.contains(*p)).collect();
                let unused: Vec<&String> =
                    declared.iter().filter(|d| !placeholders.contains(*d)).collect();
                if !undeclared.is_empty() || !unused.is_empty() {
                    return Err(PipelineError::TemplateMismatch {
                        step: name,
                        detail: format!(
                            "placeholders not declared as inputs: {:?}; inputs not used by the template: {:?}",
                            undeclared, unused
                        ),
                    });
                }
                declared
            }
        };

        Ok(Step {
            name,
            inputs,
            template,
            output_keys: self.output_keys,
            parser: self.parser,
            options: self.options,
            memory_key: self.memory_key,
        })
    }
}
