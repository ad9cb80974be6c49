//! Insert-time plumbing: hooks and interceptor binding.

use std::fmt;

use crate::erased::Erased;
use crate::handle::Handle;
use crate::shape::Shape;
use crate::signature::{Callback, Hook, Interceptor, Signature};

/// Optional callbacks run when slots are added or removed.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) on_insert: Option<Hook>,
    pub(crate) on_remove: Option<Hook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_insert", &self.on_insert.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .finish()
    }
}

/// Wrap `callback` with the interceptor installed at this moment.
///
/// The handle is captured so the interceptor can tell which slot is being
/// invoked. Errors with the interceptor's shape if it was installed for
/// another signature.
pub(crate) fn bind_target<S: Signature>(
    callback: Callback<S>,
    interceptor: Option<&Erased>,
    handle: &Handle,
) -> Result<Callback<S>, Shape> {
    let Some(erased) = interceptor else {
        return Ok(callback);
    };
    let interceptor = erased
        .downcast_ref::<Interceptor<S>>()
        .ok_or_else(|| erased.shape())?
        .clone();
    let handle = handle.clone();
    Ok(std::sync::Arc::new(move |args: S| {
        interceptor(&handle, &callback, args)
    }))
}
