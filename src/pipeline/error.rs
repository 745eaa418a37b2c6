use thiserror::Error;

use crate::backend::BackendError;
use crate::template::TemplateError;

/// Errors raised while building or running a pipeline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Initial bindings do not match the declared inputs, or a name was
    /// supplied more than once
    #[error("binding mismatch: missing {missing:?}, unexpected {unexpected:?}, duplicated {duplicated:?}")]
    BindingMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
        duplicated: Vec<String>,
    },

    /// Template placeholders and declared inputs disagree, or an input is
    /// neither declared nor produced by an earlier step
    #[error("step '{step}': template mismatch: {detail}")]
    TemplateMismatch { step: String, detail: String },

    #[error("step '{step}': invalid template: {source}")]
    InvalidTemplate {
        step: String,
        #[source]
        source: TemplateError,
    },

    /// A variable name is bound twice. `step` is `None` when the clash is
    /// between declared inputs.
    #[error("variable '{variable}' is bound more than once{}", .step.as_ref().map(|s| format!(" (step '{}')", s)).unwrap_or_default())]
    DuplicateBinding {
        step: Option<String>,
        variable: String,
    },

    #[error("declared output '{variable}' is neither an input nor produced by any step")]
    UndeclaredOutput { variable: String },

    #[error("step '{step}' has invalid definition: {detail}")]
    InvalidStep { step: String, detail: String },

    /// Internal fault: an input was not bound when its step ran
    #[error("step '{step}': input '{variable}' is not bound")]
    UnresolvedInput { step: String, variable: String },

    #[error("step '{step}': expected {expected} output fields, found {found}")]
    OutputParse {
        step: String,
        expected: usize,
        found: usize,
    },

    #[error("step {step_index} ('{step}') failed: {source}")]
    Backend {
        /// 1-based position of the failing step
        step_index: usize,
        step: String,
        #[source]
        source: BackendError,
    },
}

impl PipelineError {
    /// Raised while building a pipeline, before anything runs
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            PipelineError::TemplateMismatch { .. }
                | PipelineError::InvalidTemplate { .. }
                | PipelineError::UndeclaredOutput { .. }
                | PipelineError::InvalidStep { .. }
                | PipelineError::DuplicateBinding { .. }
        )
    }

    /// Errors that indicate a validation bug rather than bad input or a
    /// backend failure. Only meaningful for errors returned from a run.
    pub fn is_internal_fault(&self) -> bool {
        matches!(
            self,
            PipelineError::UnresolvedInput { .. } | PipelineError::DuplicateBinding { .. }
        )
    }

    /// Backend failures are the only errors a fresh run might not repeat
    pub fn is_backend_error(&self) -> bool {
        matches!(self, PipelineError::Backend { .. })
    }
}
