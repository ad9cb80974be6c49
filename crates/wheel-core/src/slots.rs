//! Ordered slot storage.
//!
//! Slots are kept in call order. Weight zero appends; a positive weight
//! lands before the first slot with a lower weight, so heavier slots run
//! first and equal weights keep insertion order. Every handle always holds
//! the position of its slot.

use crate::erased::Erased;
use crate::handle::Handle;
use crate::shape::Shape;

/// Ordering priority of a slot. Higher runs first.
pub type Weight = u16;

/// One registered callback and everything attached to it.
pub(crate) struct Slot {
    /// The callback as invoked, possibly wrapped by an interceptor.
    pub(crate) target: Erased,
    pub(crate) handle: Handle,
    pub(crate) meta: Erased,
    pub(crate) weight: Weight,
    /// Removed during an emission; skipped until the flush.
    pub(crate) scheduled_for_removal: bool,
    /// The remove hook is running for this slot.
    pub(crate) detaching: bool,
    /// Shape of the metadata while it is lent to a `with_meta` closure.
    pub(crate) lent: Option<Shape>,
}

impl Slot {
    pub(crate) fn new(target: Erased, handle: Handle, meta: Erased, weight: Weight) -> Self {
        Self {
            target,
            handle,
            meta,
            weight,
            scheduled_for_removal: false,
            detaching: false,
            lent: None,
        }
    }
}

#[derive(Default)]
pub(crate) struct SlotStore {
    slots: Vec<Slot>,
}

impl SlotStore {
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.iter_mut()
    }

    /// Slot addressed by `handle`, if the handle belongs to this store.
    pub(crate) fn slot(&self, handle: &Handle) -> Option<&Slot> {
        let index = handle.index()?;
        self.slots.get(index).filter(|slot| slot.handle == *handle)
    }

    pub(crate) fn slot_mut(&mut self, handle: &Handle) -> Option<&mut Slot> {
        let index = handle.index()?;
        self.slots
            .get_mut(index)
            .filter(|slot| slot.handle == *handle)
    }

    /// Place a slot by weight and return its position.
    pub(crate) fn place(&mut self, slot: Slot) -> usize {
        let position = if slot.weight == 0 {
            self.slots.len()
        } else {
            self.slots
                .iter()
                .position(|existing| existing.weight < slot.weight)
                .unwrap_or(self.slots.len())
        };

        self.slots.insert(position, slot);
        for (index, slot) in self.slots.iter().enumerate().skip(position) {
            slot.handle.set_index(index);
        }
        position
    }

    /// Mark the slot for removal. Returns false if the handle is not ours.
    pub(crate) fn mark_for_removal(&mut self, handle: &Handle) -> bool {
        match self.slot_mut(handle) {
            Some(slot) => {
                slot.scheduled_for_removal = true;
                true
            }
            None => false,
        }
    }

    /// Remove by swapping the last slot into the vacated position.
    ///
    /// The removed handle is invalidated and the moved slot's handle is
    /// rewritten to its new position.
    pub(crate) fn swap_remove(&mut self, handle: &Handle) -> Option<Slot> {
        let index = handle.index()?;
        if self.slots.get(index)?.handle != *handle {
            return None;
        }

        let removed = self.slots.swap_remove(index);
        removed.handle.invalidate();
        if let Some(moved) = self.slots.get(index) {
            moved.handle.set_index(index);
        }
        Some(removed)
    }
}
