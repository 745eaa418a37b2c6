use std::fs::File;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::LoggingConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log file '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

/// Build the filter: `RUST_LOG` wins, then the configured level
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialise the global tracing subscriber.
///
/// Logs go to stderr with file and line numbers; when `log_to_file` is set
/// they are also written to `log_file_path`. Calling this twice returns an
/// error instead of panicking.
pub fn init(config: &LoggingConfig, level: &str) -> Result<(), LoggingError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let file_layer = if config.log_to_file {
        let file = File::create(&config.log_file_path).map_err(|source| LoggingError::File {
            path: config.log_file_path.clone(),
            source,
        })?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
