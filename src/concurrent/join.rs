// src/concurrent/join.rs
// =============================================================================
// JoinBuffer: N result slots filled by many threads, read by one.
//
// A parallel map queues one task per input. Each task writes its result
// into "its" slot; the submitter blocks in await_all() until the last slot
// is written, then gets the whole Vec back in input order.
//
// A slot can also be *abandoned*: the task that would have filled it was
// dropped without running (the pool shut down). await_all() then returns
// ExecutorError::Cancelled instead of waiting forever.
// =============================================================================

use std::sync::{Condvar, Mutex, PoisonError};

use crate::concurrent::lock;
use crate::error::ExecutorError;

#[derive(Debug)]
struct Slots<R> {
    values: Vec<Option<R>>,
    unset: usize,
    abandoned: bool,
}

/// Fixed-size buffer of result slots with a blocking "wait for all".
#[derive(Debug)]
pub struct JoinBuffer<R> {
    slots: Mutex<Slots<R>>,
    all_set: Condvar,
}

impl<R> JoinBuffer<R> {
    pub fn new(len: usize) -> Self {
        let mut values = Vec::with_capacity(len);
        values.resize_with(len, || None);
        Self {
            slots: Mutex::new(Slots {
                values,
                unset: len,
                abandoned: false,
            }),
            all_set: Condvar::new(),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `value` in slot `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range or the slot was already set. Both are
    /// bugs in the caller, not runtime conditions.
    pub fn set(&self, index: usize, value: R) {
        let mut slots = lock(&self.slots);
        let len = slots.values.len();
        let slot = slots
            .values
            .get_mut(index)
            .unwrap_or_else(|| panic!("join slot {index} out of range (len {len})"));
        assert!(slot.is_none(), "join slot {index} set twice");
        *slot = Some(value);
        slots.unset -= 1;
        if slots.unset == 0 {
            self.all_set.notify_all();
        }
    }

    /// Records that slot `index` will never be set.
    pub fn abandon(&self, index: usize) {
        let mut slots = lock(&self.slots);
        if slots.values.get(index).is_some_and(Option::is_none) {
            slots.abandoned = true;
            self.all_set.notify_all();
        }
    }

    /// Blocks until every slot is set and returns the values in slot order.
    pub fn await_all(&self) -> Result<Vec<R>, ExecutorError> {
        let mut slots = lock(&self.slots);
        while slots.unset > 0 && !slots.abandoned {
            slots = self
                .all_set
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if slots.unset > 0 {
            return Err(ExecutorError::Cancelled);
        }
        Ok(std::mem::take(&mut slots.values)
            .into_iter()
            .flatten()
            .collect())
    }
}
