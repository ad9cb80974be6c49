//! Per-thread caller state: staged metadata and last inserted handle.
//!
//! `tag` stages a value for the next insert performed by the same thread on
//! the same event. `last_handle` remembers what that thread inserted most
//! recently, per event and per owning emitter. Neither is shared between
//! threads.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::erased::Erased;
use crate::handle::Handle;
use crate::shape::Shape;

/// Identity of an event or emitter for per-thread bookkeeping.
pub type OwnerId = u64;

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static STAGED: RefCell<HashMap<OwnerId, Erased>> = RefCell::new(HashMap::new());
    static LAST_HANDLES: RefCell<HashMap<OwnerId, Handle>> = RefCell::new(HashMap::new());
}

pub(crate) fn next_owner_id() -> OwnerId {
    NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Stage metadata for this thread's next insert on `owner`. Replaces any
/// value already staged.
pub(crate) fn stage(owner: OwnerId, meta: Erased) {
    let replaced = STAGED
        .try_with(|staged| staged.borrow_mut().insert(owner, meta))
        .ok()
        .flatten();
    drop(replaced);
}

/// Take the staged metadata, or `()` if nothing was staged.
pub(crate) fn take_staged(owner: OwnerId) -> Erased {
    STAGED
        .try_with(|staged| staged.borrow_mut().remove(&owner))
        .ok()
        .flatten()
        .unwrap_or_else(Erased::empty)
}

pub(crate) fn record_last_handle(event: OwnerId, parent: Option<OwnerId>, handle: &Handle) {
    let _ = LAST_HANDLES.try_with(|handles| {
        let mut handles = handles.borrow_mut();
        handles.insert(event, handle.clone());
        if let Some(parent) = parent {
            handles.insert(parent, handle.clone());
        }
    });
}

pub(crate) fn last_handle(owner: OwnerId) -> Option<Handle> {
    LAST_HANDLES
        .try_with(|handles| handles.borrow().get(&owner).cloned())
        .ok()
        .flatten()
}

/// Drop this thread's state for `owner`.
pub(crate) fn forget(owner: OwnerId) {
    let staged = STAGED
        .try_with(|staged| staged.borrow_mut().remove(&owner))
        .ok()
        .flatten();
    drop(staged);
    let _ = LAST_HANDLES.try_with(|handles| handles.borrow_mut().remove(&owner));
}

/// An empty allow-list admits every shape.
pub(crate) fn admits(accepted: &[Shape], shape: Shape) -> bool {
    accepted.is_empty() || accepted.contains(&shape)
}
