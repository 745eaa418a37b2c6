use serde::Deserialize;

use crate::config::config::ConfigError;

/// Represents the application section of the configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub id: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            id: "promptflow".to_string(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::InvalidAppId);
        }
        Ok(())
    }
}

/// Default log level for the application
fn default_log_level() -> String {
    "info".to_string()
}
