//! Error types for the dispatch engine
//!
//! Every error here is a caller programming error raised synchronously at the
//! point of mismatch. Nothing is retried.

use thiserror::Error;

/// Result type for engine operations
pub type WheelResult<T> = Result<T, WheelError>;

/// Errors raised by events and the emitter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WheelError {
    /// A callback, interceptor or metadata value has a shape the event does
    /// not accept.
    #[error("{}", wrong_type_message(.event, .accepted, .found, .what, .context))]
    WrongType {
        /// Name of the event
        event: String,
        /// Rendered shapes the event would have accepted
        accepted: Vec<String>,
        /// Rendered shape that was supplied
        found: String,
        /// Category of the value: "function", "interceptor" or "meta"
        what: &'static str,
        /// Operation that detected the mismatch
        context: Option<&'static str>,
    },

    /// `emit` was called with arguments that do not match the declared
    /// callback signature.
    #[error(
        "Wrong arguments for emit() in event \"{event}\":\n  expected: ({expected})\n     found: ({found})"
    )]
    WrongArguments {
        /// Name of the event
        event: String,
        /// Declared parameter list
        expected: String,
        /// Supplied parameter list
        found: String,
    },

    /// Lookup by name failed
    #[error("No such event: \"{0}\"")]
    NoSuchEvent(String),

    /// A name was redeclared with another signature under the `error` policy
    #[error("Event \"{event}\" is declared as {declared}, cannot redeclare as {requested}")]
    SignatureConflict {
        /// Name of the event
        event: String,
        /// Signature fixed at creation
        declared: String,
        /// Signature of the rejected declaration
        requested: String,
    },

    /// The metadata is lent to a running `with_meta` closure
    #[error("Metadata in event \"{event}\" is in use by with_meta() and cannot be accessed by {operation}")]
    MetaOnLoan {
        /// Name of the event
        event: String,
        /// Operation that was refused
        operation: &'static str,
    },

    /// A handle that no longer (or never) addressed a slot of this event
    #[error("Invalid handle passed to {operation} on event \"{event}\"")]
    InvalidHandle {
        /// Name of the event
        event: String,
        /// Operation that received the handle
        operation: &'static str,
    },
}

impl WheelError {
    /// Check if this is a shape mismatch
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Self::WrongType { .. })
    }

    /// Name of the event involved, if any
    pub fn event_name(&self) -> &str {
        match self {
            Self::WrongType { event, .. }
            | Self::WrongArguments { event, .. }
            | Self::SignatureConflict { event, .. }
            | Self::MetaOnLoan { event, .. }
            | Self::InvalidHandle { event, .. } => event,
            Self::NoSuchEvent(name) => name,
        }
    }
}

fn wrong_type_message(
    event: &str,
    accepted: &[String],
    found: &str,
    what: &str,
    context: &Option<&'static str>,
) -> String {
    let location = match context {
        Some(operation) => format!("for {} in", operation),
        None => "for".to_string(),
    };
    let mut message = format!("Wrong {} type {} event \"{}\":\n", what, location, event);
    for shape in accepted {
        message.push_str(&format!("  expected: {}\n", shape));
    }
    message.push_str(&format!("     found: {}", found));
    message
}
