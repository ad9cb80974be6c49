//! Typed, thread-safe event dispatch.
//!
//! Events hold callbacks of one fixed signature in weight order and invoke
//! them synchronously on `emit`. Callbacks may insert and remove callbacks,
//! including themselves, while an emission is running.
//!
//! ## Modules
//!
//! - [`event`]: a single event and its emission engine
//! - [`emitter`]: registry of named events
//! - [`handle`]: identity tokens for registered callbacks
//! - [`signature`]: callback signatures and listener conversion
//! - [`shape`]: runtime type identity for diagnostics
//! - [`error`]: error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wheel_core::{Emitter, WheelResult};
//!
//! fn main() -> WheelResult<()> {
//!     let emitter = Emitter::new();
//!     let saved = emitter.declare_event::<(String,)>("saved")?;
//!
//!     saved.tag(("audit",)).insert(|path: String| println!("saved {path}"), 10)?;
//!     saved.emit(("notes.txt".to_string(),))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod emitter;
pub mod erased;
pub mod error;
pub mod event;
pub mod handle;
mod meta;
mod pipeline;
pub mod shape;
pub mod signature;
mod slots;

pub use emitter::Emitter;
pub use erased::Erased;
pub use error::{WheelError, WheelResult};
pub use event::Event;
pub use handle::{is_valid, Handle, INVALID};
pub use shape::{render_type_name, Shape};
pub use signature::{Callback, Hook, Interceptor, Listener, Signature};
pub use slots::Weight;

pub use wheel_config::{EmitterConfig, RedeclarePolicy};
