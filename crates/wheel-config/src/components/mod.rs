//! Configuration components
//!
//! One module per table in the configuration file.

pub mod emitter;
pub mod logging;

pub use emitter::*;
pub use logging::*;
