mod tests;
mod app_config;
mod logging_config;
mod pipeline_config;
mod retrieval_config;
pub mod config;

pub use app_config::AppConfig;
pub use config::{Config, ConfigError};
pub use logging_config::LoggingConfig;
pub use pipeline_config::{PipelineConfig, StepConfig};
pub use retrieval_config::RetrievalConfig;
