//! Logging configuration

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{Directive, EnvFilter};

/// Output format for the fmt subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human readable output
    #[default]
    Text,
    /// Multi-line human readable output
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter, e.g. `info` or `warn,wheel_core=debug`
    pub level: String,

    /// Output format
    pub format: LogFormat,

    /// Extra per-target directives, e.g. `wheel_core::event=trace`
    pub directives: Vec<String>,

    /// Whether to include the target/module in each line
    pub include_target: bool,

    /// Whether to use ANSI colors
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            directives: Vec::new(),
            include_target: true,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Check that the level and every directive parse as filter syntax.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }
        EnvFilter::try_new(&self.level).map_err(|e| {
            ConfigError::Invalid(format!("invalid logging.level '{}': {}", self.level, e))
        })?;
        for directive in &self.directives {
            directive.parse::<Directive>().map_err(|e| {
                ConfigError::Invalid(format!("invalid logging directive '{}': {}", directive, e))
            })?;
        }
        Ok(())
    }
}
