// src/concurrent/queue.rs
// =============================================================================
// A thread-safe FIFO queue with blocking pop and non-blocking push.
//
// This is the foundation of the worker pool: workers sit in pop() until
// someone pushes a task, and close() wakes every one of them up so they
// can exit.
//
// How it works:
// - A Mutex guards a VecDeque plus a `closed` flag
// - A Condvar ("not empty") wakes poppers when a task arrives or on close
//
// Rust concepts:
// - Mutex + Condvar: the classic "wait until condition holds" pattern
// - VecDeque: O(1) push_back / pop_front
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::concurrent::lock;
use crate::error::QueueError;

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// FIFO queue shared between producers and blocking consumers.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Appends `item` and wakes one waiting popper. Never blocks.
    ///
    /// After [`close`](Self::close) the item is dropped and
    /// `QueueError::Closed` is returned.
    pub fn push(&self, item: T) -> Result<(), QueueError> {
        let mut state = lock(&self.state);
        if state.closed {
            // Drop the item outside the lock: its destructor may take other locks
            drop(state);
            drop(item);
            return Err(QueueError::Closed);
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks until an item is available and removes it.
    ///
    /// Returns `QueueError::Interrupted` once the queue is closed.
    pub fn pop(&self) -> Result<T, QueueError> {
        let mut state = lock(&self.state);
        loop {
            if state.closed {
                return Err(QueueError::Interrupted);
            }
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// Closes the queue: pending items are dropped, every popper wakes up
    /// with `Interrupted`. Calling it again does nothing.
    pub fn close(&self) {
        let abandoned = {
            let mut state = lock(&self.state);
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.items)
        };
        self.not_empty.notify_all();
        drop(abandoned);
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
