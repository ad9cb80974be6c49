//! # Wheel Configuration Library
//!
//! Configuration for the wheel event engine: emitter policies and logging.
//! Everything has a default, so an empty file (or no file at all) is a valid
//! configuration.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wheel_config::{init_logging, WheelConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WheelConfig::load("wheel.toml")?;
//!     init_logging(&config.logging)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
mod error;
mod logging;

pub use components::*;
pub use error::{ConfigError, ConfigResult};
pub use logging::{build_filter, init_logging};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, one table per component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WheelConfig {
    /// Registry behaviour
    pub emitter: EmitterConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl WheelConfig {
    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading wheel configuration");
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        self.logging.validate()
    }
}
