pub mod bindings;
pub mod definition;
pub mod error;
pub mod executor;
pub mod memory;
pub mod parser;
pub mod step;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use bindings::Bindings;
pub use definition::{Pipeline, PipelineBuilder};
pub use error::PipelineError;
pub use executor::{PipelineExecutor, RunOutput};
pub use memory::{Exchange, Transcripts};
pub use parser::OutputParser;
pub use step::{Step, StepBuilder};
