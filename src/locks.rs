//! Keyed mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A map of independently lockable slots.
///
/// Work on different keys never contends; work on the same key runs one
/// at a time. Each slot carries a `T` that lives until the slot is
/// released; the save service uses it to cache an owner's index inside the
/// lock that guards it. Callers with short-lived keys use [`with_slot`]
/// so idle slots do not accumulate.
///
/// [`with_slot`]: KeyedLocks::with_slot
#[derive(Debug)]
pub struct KeyedLocks<T> {
    slots: Mutex<HashMap<String, Arc<Mutex<T>>>>,
}

impl<T: Default> KeyedLocks<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The slot for `key`, created on first use.
    ///
    /// Lock the returned slot with [`lock_slot`]; the map itself is only
    /// held long enough to look the slot up.
    pub fn slot(&self, key: &str) -> Arc<Mutex<T>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Run `f` while holding the slot for `key`, then drop the slot if no
    /// one else is using it.
    pub fn with_slot<R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let slot = self.slot(key);
            let mut guard = lock_slot(&slot);
            f(&mut guard)
        };
        self.release(key);
        result
    }

    /// Remove the slot for `key` when the map holds its only reference.
    ///
    /// A slot still held or waited on elsewhere stays in place.
    pub fn release(&self, key: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(key);
        }
    }

    /// Number of slots currently allocated.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Default> Default for KeyedLocks<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a slot, recovering the data if a previous holder panicked.
///
/// Slot contents are caches that can always be reloaded from durable
/// state, so a poisoned lock is not fatal.
pub fn lock_slot<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
