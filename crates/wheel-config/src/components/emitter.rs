//! Emitter (event registry) configuration

use serde::{Deserialize, Serialize};

/// What `declare_event` does when a name is already declared with a
/// different signature. The existing event is kept in every case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedeclarePolicy {
    /// Return the existing event silently
    Ignore,
    /// Return the existing event and log a warning
    #[default]
    Warn,
    /// Fail with a signature conflict
    Error,
}

/// Configuration for an emitter and the events it creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterConfig {
    /// Reaction to conflicting redeclarations
    pub redeclare: RedeclarePolicy,

    /// Weight used by `subscribe`, the weightless insertion form
    pub default_weight: u16,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            redeclare: RedeclarePolicy::Warn,
            default_weight: 0,
        }
    }
}
