//! Name-to-event registry.
//!
//! An [`Emitter`] owns a set of named events. Each name is bound to one
//! signature the first time it is declared; later declarations of the same
//! name are resolved by the configured [`RedeclarePolicy`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wheel_core::Emitter;
//!
//! let emitter = Emitter::new();
//! emitter.declare_event::<(u32, u32)>("resized")?;
//!
//! emitter.get("resized")?.insert(|w: u32, h: u32| println!("{w}x{h}"), 0)?;
//! emitter.get("resized")?.emit((640, 480))?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};
use wheel_config::{EmitterConfig, RedeclarePolicy};

use crate::error::{WheelError, WheelResult};
use crate::event::Event;
use crate::handle::Handle;
use crate::meta::{self, OwnerId};
use crate::signature::Signature;
use crate::slots::Weight;

type EventFactory = fn(String, OwnerId, Weight) -> Event;

fn make_event<S: Signature>(name: String, parent: OwnerId, default_weight: Weight) -> Event {
    Event::owned_by::<S>(name, Some(parent), default_weight)
}

/// Registry of named events.
pub struct Emitter {
    id: OwnerId,
    config: EmitterConfig,
    events: RwLock<BTreeMap<String, Arc<Event>>>,
    default_event: Option<EventFactory>,
}

impl Emitter {
    /// Create an emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Create an emitter with an explicit configuration.
    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            id: meta::next_owner_id(),
            config,
            events: RwLock::new(BTreeMap::new()),
            default_event: None,
        }
    }

    /// Create an emitter whose `get` creates missing events with
    /// signature `S` instead of failing.
    pub fn with_default_signature<S: Signature>() -> Self {
        Self::new().default_signature::<S>()
    }

    /// Builder form of [`Emitter::with_default_signature`].
    pub fn default_signature<S: Signature>(mut self) -> Self {
        self.default_event = Some(make_event::<S>);
        self
    }

    /// Configuration the emitter was created with.
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Declare `name` with signature `S`, creating the event on first use.
    ///
    /// # Errors
    ///
    /// `SignatureConflict` if the name already exists with another
    /// signature and the redeclare policy is `error`.
    pub fn declare_event<S: Signature>(&self, name: &str) -> WheelResult<Arc<Event>> {
        let existing = self.events.read().get(name).cloned();
        if let Some(event) = existing {
            return self.redeclare::<S>(event);
        }

        let mut events = self.events.write();
        let raced = events.get(name).cloned();
        if let Some(event) = raced {
            drop(events);
            return self.redeclare::<S>(event);
        }

        let event = Arc::new(make_event::<S>(
            name.to_string(),
            self.id,
            self.config.default_weight,
        ));
        events.insert(name.to_string(), event.clone());
        debug!(event = name, signature = %event.describe(), "event declared");
        Ok(event)
    }

    fn redeclare<S: Signature>(&self, event: Arc<Event>) -> WheelResult<Arc<Event>> {
        if event.signature_shape() == S::shape() {
            return Ok(event);
        }

        match self.config.redeclare {
            RedeclarePolicy::Ignore => Ok(event),
            RedeclarePolicy::Warn => {
                warn!(
                    event = %event.name(),
                    declared = %event.describe(),
                    requested = %S::describe(),
                    "event redeclared with a different signature, keeping the original"
                );
                Ok(event)
            }
            RedeclarePolicy::Error => Err(WheelError::SignatureConflict {
                event: event.name().to_string(),
                declared: event.describe().to_string(),
                requested: S::describe(),
            }),
        }
    }

    /// Look up an event by name.
    ///
    /// # Errors
    ///
    /// `NoSuchEvent` if the name was never declared and no default
    /// signature is configured.
    pub fn get(&self, name: &str) -> WheelResult<Arc<Event>> {
        if let Some(event) = self.events.read().get(name) {
            return Ok(event.clone());
        }

        let factory = self
            .default_event
            .ok_or_else(|| WheelError::NoSuchEvent(name.to_string()))?;
        let mut events = self.events.write();
        let event = events
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(event = name, "default event created");
                Arc::new(factory(name.to_string(), self.id, self.config.default_weight))
            })
            .clone();
        Ok(event)
    }

    /// Remove `name` from the registry and return its event.
    pub fn retire(&self, name: &str) -> Option<Arc<Event>> {
        let retired = self.events.write().remove(name);
        if retired.is_some() {
            debug!(event = name, "event retired");
        }
        retired
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.events.read().contains_key(name)
    }

    /// Declared names in order.
    pub fn names(&self) -> Vec<String> {
        self.events.read().keys().cloned().collect()
    }

    /// Number of declared events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether no event is declared.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Handle of the last callback this thread inserted into any event of
    /// this emitter.
    pub fn last_handle(&self) -> Option<Handle> {
        meta::last_handle(self.id)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        meta::forget(self.id);
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("events", &self.names())
            .field("config", &self.config)
            .finish()
    }
}
