//! Subscriber installation
//!
//! The engine only emits `tracing` events; hosts that want them printed call
//! [`init_logging`] once at startup.

use crate::{ConfigError, ConfigResult, LogFormat, LoggingConfig};
use std::sync::Once;
use tracing_subscriber::filter::{Directive, EnvFilter};

/// Static initialization guard
static INIT: Once = Once::new();

/// Build the filter for `config`. `RUST_LOG`, when set and valid, wins.
pub fn build_filter(config: &LoggingConfig) -> ConfigResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level).map_err(|e| {
        ConfigError::Invalid(format!("invalid logging.level '{}': {}", config.level, e))
    })?;
    for directive in &config.directives {
        let parsed = directive.parse::<Directive>().map_err(|e| {
            ConfigError::Invalid(format!("invalid logging directive '{}': {}", directive, e))
        })?;
        filter = filter.add_directive(parsed);
    }
    Ok(filter)
}

/// Install a global fmt subscriber. Only the first call has any effect.
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<()> {
    let filter = build_filter(config)?;
    let mut result = Ok(());

    INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.include_target)
            .with_ansi(config.ansi);

        let installed = match config.format {
            LogFormat::Text => builder.try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };

        if let Err(e) = installed {
            result = Err(ConfigError::Invalid(format!(
                "failed to install log subscriber: {}",
                e
            )));
        }
    });

    if result.is_ok() {
        tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
    }
    result
}
