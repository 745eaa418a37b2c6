use ollama_client::OllamaConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::app_config::AppConfig;
use crate::config::logging_config::LoggingConfig;
use crate::config::pipeline_config::PipelineConfig;
use crate::config::retrieval_config::RetrievalConfig;
use crate::pipeline::{Pipeline, PipelineError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid app id")]
    InvalidAppId,
    #[error("Invalid backend config: {0}")]
    InvalidBackend(String),
    #[error("Invalid retrieval config: {0}")]
    InvalidRetrieval(String),
    #[error("Pipeline '{name}' is invalid: {source}")]
    Pipeline {
        name: String,
        #[source]
        source: PipelineError,
    },
    #[error("Unknown pipeline '{0}'")]
    UnknownPipeline(String),
}

/// Application configuration, loaded from TOML
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backend: OllamaConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineConfig>,
}

impl Config {
    /// Read, parse and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::load_from_str(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML string
    pub fn load_from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section. Pipelines are fully built, so a malformed
    /// pipeline is reported here rather than when it first runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.app.validate()?;
        self.backend
            .validate()
            .map_err(|e| ConfigError::InvalidBackend(e.to_string()))?;
        self.retrieval.validate()?;
        for name in self.pipelines.keys() {
            self.build_pipeline(name)?;
        }
        Ok(())
    }

    /// Build a single configured pipeline
    pub fn build_pipeline(&self, name: &str) -> Result<Pipeline, ConfigError> {
        let pipeline_config = self
            .pipelines
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPipeline(name.to_string()))?;
        pipeline_config
            .to_pipeline(name)
            .map_err(|source| ConfigError::Pipeline {
                name: name.to_string(),
                source,
            })
    }

    /// Build every configured pipeline, keyed by name
    pub fn build_pipelines(&self) -> Result<BTreeMap<String, Pipeline>, ConfigError> {
        self.pipelines
            .keys()
            .map(|name| Ok((name.clone(), self.build_pipeline(name)?)))
            .collect()
    }
}
