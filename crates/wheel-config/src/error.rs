//! Error types for configuration loading

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading, parsing or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML was malformed or contained unknown keys
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Rendering back to TOML failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parsed fine but a value is unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
