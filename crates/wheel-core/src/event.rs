//! A single named event and its dispatch engine.
//!
//! An [`Event`] accepts callbacks of exactly one [`Signature`], keeps them in
//! weight order and invokes them synchronously on [`Event::emit`].
//!
//! ## Locking
//!
//! All state sits behind one `parking_lot::ReentrantMutex` holding a
//! `RefCell`. The lock is held for a whole emission, so emissions from
//! different threads never interleave, while callbacks running on the
//! emitting thread can re-enter the event. No `RefCell` borrow is held while
//! a callback, hook or interceptor runs.
//!
//! ## Mutation during emission
//!
//! While an emission is in progress, `insert` queues the new slot and
//! `remove` marks the slot as skipped and queues its handle. When the
//! outermost emission ends, queued inserts are placed first and queued
//! removals applied afterwards. This also happens when a callback panics.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wheel_core::Event;
//!
//! let event = Event::new::<(i32, String)>("changed");
//! event.tag((42, "x".to_string())).insert(|n: i32, s: String| println!("{n} {s}"), 5)?;
//! let handle = event.last_handle().unwrap();
//!
//! event.emit((1, "one".to_string()))?;
//! event.remove(&handle);
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, trace};

use crate::erased::Erased;
use crate::error::{WheelError, WheelResult};
use crate::handle::Handle;
use crate::meta::{self, OwnerId};
use crate::pipeline::{self, Hooks};
use crate::shape::Shape;
use crate::signature::{Callback, Interceptor, Listener, Signature};
use crate::slots::{Slot, SlotStore, Weight};

#[derive(Default)]
struct EventState {
    slots: SlotStore,
    accepted_meta: Vec<Shape>,
    hooks: Hooks,
    interceptor: Option<Erased>,
    /// Number of emissions in progress on the lock-holding thread.
    depth: usize,
    pending_inserts: Vec<Slot>,
    pending_removes: Vec<Handle>,
    queued_removes: HashSet<Handle>,
}

impl EventState {
    fn slot_mut(&mut self, handle: &Handle) -> Option<&mut Slot> {
        if self.slots.slot(handle).is_some() {
            return self.slots.slot_mut(handle);
        }
        self.pending_inserts
            .iter_mut()
            .find(|slot| slot.handle == *handle)
    }

    fn queue_removal(&mut self, handle: Handle) {
        if self.queued_removes.insert(handle.clone()) {
            self.pending_removes.push(handle);
        }
    }
}

/// A named, signature-fixed collection of ordered callbacks.
pub struct Event {
    name: String,
    id: OwnerId,
    parent: Option<OwnerId>,
    default_weight: Weight,
    signature: Shape,
    params: String,
    describe: String,
    interceptor_shape: Shape,
    describe_interceptor: String,
    state: ReentrantMutex<RefCell<EventState>>,
}

/// Metadata lent to a `with_meta` closure. Puts the value back on drop,
/// including on unwind.
struct MetaLoan<'a> {
    event: &'a Event,
    handle: &'a Handle,
    value: Erased,
}

impl Drop for MetaLoan<'_> {
    fn drop(&mut self) {
        let value = mem::replace(&mut self.value, Erased::empty());
        let displaced = {
            let guard = self.event.state.lock();
            let mut state = guard.borrow_mut();
            match state.slot_mut(self.handle) {
                Some(slot) => {
                    slot.lent = None;
                    mem::replace(&mut slot.meta, value)
                }
                None => value,
            }
        };
        drop(displaced);
    }
}

/// Ends an emission. Runs on normal exit and on unwind.
struct Emission<'a> {
    event: &'a Event,
}

impl Drop for Emission<'_> {
    fn drop(&mut self) {
        let outermost = {
            let guard = self.event.state.lock();
            let mut state = guard.borrow_mut();
            state.depth -= 1;
            state.depth == 0
        };
        if outermost {
            self.event.flush();
        }
    }
}

impl Event {
    /// Create a standalone event accepting callbacks of signature `S`.
    pub fn new<S: Signature>(name: impl Into<String>) -> Self {
        Self::owned_by::<S>(name.into(), None, 0)
    }

    pub(crate) fn owned_by<S: Signature>(
        name: String,
        parent: Option<OwnerId>,
        default_weight: Weight,
    ) -> Self {
        Self {
            name,
            id: meta::next_owner_id(),
            parent,
            default_weight,
            signature: S::shape(),
            params: S::params(),
            describe: S::describe(),
            interceptor_shape: S::interceptor_shape(),
            describe_interceptor: S::describe_interceptor(),
            state: ReentrantMutex::new(RefCell::new(EventState::default())),
        }
    }

    /// Name the event was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered parameter list, e.g. `i32, String`.
    pub fn signature(&self) -> &str {
        &self.params
    }

    /// Shape of the parameter tuple, used for signature checks.
    pub fn signature_shape(&self) -> Shape {
        self.signature
    }

    /// Callback type, e.g. `fn(i32, String)`.
    pub fn describe(&self) -> &str {
        &self.describe
    }

    /// Whether an emission is in progress.
    pub fn is_emitting(&self) -> bool {
        self.state.lock().borrow().depth > 0
    }

    /// Register a callback with the given weight.
    ///
    /// Consumes whatever this thread staged with [`Event::tag`], even when
    /// the insert fails. The new handle is available through
    /// [`Event::last_handle`] afterwards.
    ///
    /// # Errors
    ///
    /// `WrongType` if `S` is not the event's signature, or if the staged
    /// metadata is not admitted by the allow-list.
    pub fn insert<S, L>(&self, listener: L, weight: Weight) -> WheelResult<&Self>
    where
        S: Signature,
        L: Listener<S>,
    {
        let staged = meta::take_staged(self.id);
        self.check_signature::<S>("insert()")?;

        let guard = self.state.lock();
        let (handle, ready) = {
            let mut state = guard.borrow_mut();
            if !meta::admits(&state.accepted_meta, staged.shape()) {
                return Err(self.wrong_type(
                    render_all(&state.accepted_meta),
                    staged.shape().render(),
                    "meta",
                    "insert()",
                ));
            }

            let handle = Handle::new(state.slots.len() + state.pending_inserts.len());
            let target = pipeline::bind_target(
                listener.into_callback(),
                state.interceptor.as_ref(),
                &handle,
            )
            .map_err(|found| {
                self.wrong_type(
                    vec![self.describe_interceptor.clone()],
                    found.render(),
                    "interceptor",
                    "insert()",
                )
            })?;
            let slot = Slot::new(Erased::new(target), handle.clone(), staged, weight);

            if state.depth > 0 {
                trace!(event = %self.name, weight, deferred = true, "callback queued");
                state.pending_inserts.push(slot);
                (handle, None)
            } else {
                (handle, Some(slot))
            }
        };

        meta::record_last_handle(self.id, self.parent, &handle);
        if let Some(slot) = ready {
            self.place(slot);
        }
        Ok(self)
    }

    /// Register a callback at the default weight.
    pub fn subscribe<S, L>(&self, listener: L) -> WheelResult<&Self>
    where
        S: Signature,
        L: Listener<S>,
    {
        self.insert(listener, self.default_weight)
    }

    /// Handle of the last callback this thread inserted into this event.
    pub fn last_handle(&self) -> Option<Handle> {
        meta::last_handle(self.id)
    }

    /// Remove the callback behind `handle`. Invalid and foreign handles are
    /// ignored.
    pub fn remove(&self, handle: &Handle) -> &Self {
        if !handle.is_valid() {
            return self;
        }

        let guard = self.state.lock();
        let deferred = {
            let mut state = guard.borrow_mut();
            if state.depth > 0 {
                let stored = state.slots.mark_for_removal(handle);
                let pending = state.pending_inserts.iter().any(|slot| slot.handle == *handle);
                if stored || pending {
                    trace!(event = %self.name, index = handle.value(), deferred = true, "removal queued");
                    state.queue_removal(handle.clone());
                }
                true
            } else {
                false
            }
        };

        if !deferred {
            self.erase(handle);
        }
        self
    }

    /// Remove every callback, running the remove hook for each.
    pub fn clear(&self) -> &Self {
        let guard = self.state.lock();
        let deferred = {
            let mut state = guard.borrow_mut();
            if state.depth > 0 {
                let state = &mut *state;
                let mut queued = Vec::with_capacity(state.slots.len() + state.pending_inserts.len());
                for slot in state.slots.iter_mut() {
                    slot.scheduled_for_removal = true;
                    queued.push(slot.handle.clone());
                }
                queued.extend(state.pending_inserts.iter().map(|slot| slot.handle.clone()));
                for handle in queued {
                    state.queue_removal(handle);
                }
                true
            } else {
                false
            }
        };

        if !deferred {
            loop {
                let last = {
                    let state = guard.borrow();
                    state
                        .slots
                        .len()
                        .checked_sub(1)
                        .and_then(|index| state.slots.get(index))
                        .map(|slot| slot.handle.clone())
                };
                match last {
                    Some(handle) if self.erase(&handle) => {}
                    _ => break,
                }
            }
        }
        self
    }

    /// Stored callbacks plus inserts not yet flushed.
    pub fn length(&self) -> usize {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.slots.len() + state.pending_inserts.len()
    }

    /// Whether [`Event::length`] is zero.
    pub fn empty(&self) -> bool {
        self.length() == 0
    }

    /// Invoke every callback in order with a clone of `args`.
    ///
    /// # Errors
    ///
    /// `WrongArguments` if `S` is not the event's signature. Panics from
    /// callbacks propagate after queued mutations are flushed.
    pub fn emit<S: Signature>(&self, args: S) -> WheelResult<()> {
        if S::shape() != self.signature {
            return Err(WheelError::WrongArguments {
                event: self.name.clone(),
                expected: self.params.clone(),
                found: S::params(),
            });
        }

        let guard = self.state.lock();
        let length = {
            let mut state = guard.borrow_mut();
            state.depth += 1;
            state.slots.len()
        };
        let _emission = Emission { event: self };
        trace!(event = %self.name, length, "emission started");

        for index in 0..length {
            let target = {
                let state = guard.borrow();
                state
                    .slots
                    .get(index)
                    .filter(|slot| !slot.scheduled_for_removal)
                    .and_then(|slot| slot.target.downcast_ref::<Callback<S>>())
                    .cloned()
            };
            if let Some(target) = target {
                target(args.clone());
            }
        }

        trace!(event = %self.name, "emission finished");
        Ok(())
    }

    /// Stage metadata for this thread's next insert.
    pub fn tag<M: Any + Send + Sync>(&self, meta: M) -> &Self {
        meta::stage(self.id, Erased::new(meta));
        self
    }

    /// Clone of the metadata recorded for `handle`.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` for a handle this event does not hold, `WrongType`
    /// if the recorded metadata is not an `M`, `MetaOnLoan` from inside a
    /// [`Event::with_meta`] closure for the same handle.
    pub fn get_meta<M: Any + Clone>(&self, handle: &Handle) -> WheelResult<M> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let slot = state
            .slot_mut(handle)
            .ok_or_else(|| self.invalid_handle("get_meta()"))?;
        if slot.lent.is_some() {
            return Err(self.meta_on_loan("get_meta()"));
        }
        slot.meta.downcast_ref::<M>().cloned().ok_or_else(|| {
            self.wrong_type(
                vec![slot.meta.shape().render()],
                Shape::of::<M>().render(),
                "meta",
                "get_meta()",
            )
        })
    }

    /// Run `f` on the metadata recorded for `handle`.
    ///
    /// The value is lent to `f`, so `f` may call back into the event.
    /// While the loan lasts, `get_meta`, `set_meta` and `with_meta` on the
    /// same handle fail with `MetaOnLoan`. Whatever `f` leaves in the value
    /// is written back, also when `f` panics.
    pub fn with_meta<M, R, F>(&self, handle: &Handle, f: F) -> WheelResult<R>
    where
        M: Any,
        F: FnOnce(&mut M) -> R,
    {
        let guard = self.state.lock();
        let taken = {
            let mut state = guard.borrow_mut();
            let slot = state
                .slot_mut(handle)
                .ok_or_else(|| self.invalid_handle("with_meta()"))?;
            if slot.lent.is_some() {
                return Err(self.meta_on_loan("with_meta()"));
            }
            if !slot.meta.is::<M>() {
                return Err(self.wrong_type(
                    vec![slot.meta.shape().render()],
                    Shape::of::<M>().render(),
                    "meta",
                    "with_meta()",
                ));
            }
            slot.lent = Some(slot.meta.shape());
            mem::replace(&mut slot.meta, Erased::empty())
        };

        let mut loan = MetaLoan {
            event: self,
            handle,
            value: taken,
        };
        let result = loan.value.downcast_mut::<M>().map(f);
        drop(loan);

        result.ok_or_else(|| self.invalid_handle("with_meta()"))
    }

    /// Replace the metadata recorded for `handle`.
    ///
    /// A slot inserted without metadata accepts any shape; otherwise the
    /// shape must match the recorded one. The allow-list, when set, must
    /// admit the new shape either way. Fails with `MetaOnLoan` from inside a
    /// [`Event::with_meta`] closure for the same handle.
    pub fn set_meta<M: Any + Send + Sync>(&self, handle: &Handle, meta: M) -> WheelResult<&Self> {
        let shape = Shape::of::<M>();
        let guard = self.state.lock();
        let previous = {
            let mut state = guard.borrow_mut();
            let accepted = state.accepted_meta.clone();
            let slot = state
                .slot_mut(handle)
                .ok_or_else(|| self.invalid_handle("set_meta()"))?;
            if slot.lent.is_some() {
                return Err(self.meta_on_loan("set_meta()"));
            }
            let recorded = slot.meta.shape();

            if !recorded.is_empty() && recorded != shape {
                return Err(self.wrong_type(
                    vec![recorded.render()],
                    shape.render(),
                    "meta",
                    "set_meta()",
                ));
            }
            if !meta::admits(&accepted, shape) {
                return Err(self.wrong_type(
                    render_all(&accepted),
                    shape.render(),
                    "meta",
                    "set_meta()",
                ));
            }
            mem::replace(&mut slot.meta, Erased::new(meta))
        };
        drop(previous);
        Ok(self)
    }

    /// Whether `handle` is held by this event and its metadata is an `M`.
    pub fn is_meta_of<M: Any>(&self, handle: &Handle) -> bool {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state
            .slot_mut(handle)
            .is_some_and(|slot| match slot.lent {
                Some(shape) => shape == Shape::of::<M>(),
                None => slot.meta.is::<M>(),
            })
    }

    /// Add `M` to the metadata allow-list.
    pub fn accept_meta<M: Any>(&self) -> &Self {
        let shape = Shape::of::<M>();
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if !state.accepted_meta.contains(&shape) {
            state.accepted_meta.push(shape);
        }
        self
    }

    /// Clear the allow-list so any metadata shape is admitted.
    pub fn accept_any_meta(&self) -> &Self {
        self.state.lock().borrow_mut().accepted_meta.clear();
        self
    }

    /// Current metadata allow-list. Empty means any shape is admitted.
    pub fn accepted_meta_shapes(&self) -> Vec<Shape> {
        self.state.lock().borrow().accepted_meta.clone()
    }

    /// Run `hook` after every slot is placed.
    pub fn set_on_insert<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Handle) + Send + Sync + 'static,
    {
        let previous = self.replace_hooks(|hooks| hooks.on_insert.replace(Arc::new(hook)));
        drop(previous);
        debug!(event = %self.name, "insert hook set");
        self
    }

    /// Remove the insert hook.
    pub fn unset_on_insert(&self) -> &Self {
        let previous = self.replace_hooks(|hooks| hooks.on_insert.take());
        drop(previous);
        debug!(event = %self.name, "insert hook unset");
        self
    }

    /// Run `hook` before every slot is erased.
    pub fn set_on_remove<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Handle) + Send + Sync + 'static,
    {
        let previous = self.replace_hooks(|hooks| hooks.on_remove.replace(Arc::new(hook)));
        drop(previous);
        debug!(event = %self.name, "remove hook set");
        self
    }

    /// Remove the remove hook.
    pub fn unset_on_remove(&self) -> &Self {
        let previous = self.replace_hooks(|hooks| hooks.on_remove.take());
        drop(previous);
        debug!(event = %self.name, "remove hook unset");
        self
    }

    /// Route callbacks inserted from now on through `interceptor`.
    ///
    /// Callbacks already stored keep their current binding.
    ///
    /// # Errors
    ///
    /// `WrongType` if `S` is not the event's signature.
    pub fn set_interceptor<S, F>(&self, interceptor: F) -> WheelResult<&Self>
    where
        S: Signature,
        F: Fn(&Handle, &Callback<S>, S) + Send + Sync + 'static,
    {
        if S::interceptor_shape() != self.interceptor_shape {
            return Err(self.wrong_type(
                vec![self.describe_interceptor.clone()],
                S::describe_interceptor(),
                "interceptor",
                "set_interceptor()",
            ));
        }

        let interceptor: Interceptor<S> = Arc::new(interceptor);
        let previous = {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            state.interceptor.replace(Erased::new(interceptor))
        };
        drop(previous);
        debug!(event = %self.name, "interceptor set");
        Ok(self)
    }

    /// Stop routing new callbacks through an interceptor. Callbacks
    /// already stored keep their binding.
    pub fn unset_interceptor(&self) -> &Self {
        let previous = {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            state.interceptor.take()
        };
        drop(previous);
        debug!(event = %self.name, "interceptor unset");
        self
    }

    /// The stored invocation target of `handle`, including any interceptor
    /// wrapper bound at insertion.
    pub fn get_function<S: Signature>(&self, handle: &Handle) -> WheelResult<Callback<S>> {
        self.check_signature::<S>("get_function()")?;
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let slot = state
            .slot_mut(handle)
            .ok_or_else(|| self.invalid_handle("get_function()"))?;
        slot.target
            .downcast_ref::<Callback<S>>()
            .cloned()
            .ok_or_else(|| {
                self.wrong_type(
                    vec![self.describe.clone()],
                    S::describe(),
                    "function",
                    "get_function()",
                )
            })
    }

    fn place(&self, slot: Slot) {
        let handle = slot.handle.clone();
        let weight = slot.weight;
        let guard = self.state.lock();
        let (index, hook) = {
            let mut state = guard.borrow_mut();
            let index = state.slots.place(slot);
            (index, state.hooks.on_insert.clone())
        };
        trace!(event = %self.name, index, weight, deferred = false, "callback placed");
        if let Some(hook) = hook {
            hook(&handle);
        }
    }

    /// Remove a stored slot now. Returns false if nothing was removed.
    fn erase(&self, handle: &Handle) -> bool {
        let guard = self.state.lock();
        let hook = {
            let mut state = guard.borrow_mut();
            let Some(slot) = state.slots.slot_mut(handle) else {
                return false;
            };
            if slot.detaching {
                return false;
            }
            slot.detaching = true;
            state.hooks.on_remove.clone()
        };

        if let Some(hook) = hook {
            hook(handle);
        }

        let index = handle.value();
        let removed = guard.borrow_mut().slots.swap_remove(handle);
        let erased = removed.is_some();
        drop(removed);
        if erased {
            trace!(event = %self.name, index, deferred = false, "callback removed");
        }
        erased
    }

    fn flush(&self) {
        let guard = self.state.lock();
        let (inserts, removes) = {
            let mut state = guard.borrow_mut();
            (
                mem::take(&mut state.pending_inserts),
                mem::take(&mut state.pending_removes),
            )
        };
        guard.borrow_mut().queued_removes.clear();
        if inserts.is_empty() && removes.is_empty() {
            return;
        }

        trace!(
            event = %self.name,
            inserts = inserts.len(),
            removes = removes.len(),
            "flushing deferred operations"
        );
        for slot in inserts {
            self.place(slot);
        }
        for handle in removes {
            self.erase(&handle);
        }
    }

    fn replace_hooks<T>(&self, f: impl FnOnce(&mut Hooks) -> T) -> T {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state.hooks)
    }

    fn check_signature<S: Signature>(&self, context: &'static str) -> WheelResult<()> {
        if S::shape() == self.signature {
            Ok(())
        } else {
            Err(self.wrong_type(
                vec![self.describe.clone()],
                S::describe(),
                "function",
                context,
            ))
        }
    }

    fn wrong_type(
        &self,
        accepted: Vec<String>,
        found: String,
        what: &'static str,
        context: &'static str,
    ) -> WheelError {
        WheelError::WrongType {
            event: self.name.clone(),
            accepted,
            found,
            what,
            context: Some(context),
        }
    }

    fn meta_on_loan(&self, operation: &'static str) -> WheelError {
        WheelError::MetaOnLoan {
            event: self.name.clone(),
            operation,
        }
    }

    fn invalid_handle(&self, operation: &'static str) -> WheelError {
        WheelError::InvalidHandle {
            event: self.name.clone(),
            operation,
        }
    }
}

fn render_all(shapes: &[Shape]) -> Vec<String> {
    shapes.iter().map(Shape::render).collect()
}

impl Drop for Event {
    fn drop(&mut self) {
        self.clear();
        meta::forget(self.id);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("signature", &self.describe)
            .field("length", &self.length())
            .field("emitting", &self.is_emitting())
            .finish()
    }
}
