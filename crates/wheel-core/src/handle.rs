//! Handles: shared identity tokens for registered callbacks.
//!
//! A [`Handle`] is produced by `insert` and doubles as the live position of
//! its slot. The event rewrites the position in place whenever slots move,
//! and sets it to [`INVALID`] on removal, so every clone of a handle sees the
//! same value. Handles compare by identity of the shared cell, never by value.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

/// Value of a handle whose slot has been removed.
pub const INVALID: isize = -1;

/// Shared, mutable identity cell for one registered callback.
#[derive(Clone)]
pub struct Handle(Arc<AtomicIsize>);

impl Handle {
    pub(crate) fn new(index: usize) -> Self {
        Self(Arc::new(AtomicIsize::new(index as isize)))
    }

    /// A handle that never addressed anything. Removing it is a no-op.
    pub fn detached() -> Self {
        Self(Arc::new(AtomicIsize::new(INVALID)))
    }

    /// Current position of the slot, or [`INVALID`].
    pub fn value(&self) -> isize {
        self.0.load(Ordering::Acquire)
    }

    /// Current position of the slot, if it still exists.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.value()).ok()
    }

    /// Whether the slot still exists.
    pub fn is_valid(&self) -> bool {
        self.value() != INVALID
    }

    pub(crate) fn set_index(&self, index: usize) {
        self.0.store(index as isize, Ordering::Release);
    }

    pub(crate) fn invalidate(&self) {
        self.0.store(INVALID, Ordering::Release);
    }
}

/// `handle` is present and its slot still exists.
pub fn is_valid(handle: Option<&Handle>) -> bool {
    handle.is_some_and(Handle::is_valid)
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "Handle({})", index),
            None => f.write_str("Handle(invalid)"),
        }
    }
}
