// src/concurrent/executor.rs
// =============================================================================
// ParallelExecutor: "apply f to every element, in parallel, keep the order".
//
// map(f, inputs) queues one task per input on a WorkerPool. Task i computes
// f(inputs[i]) and writes it into slot i of a JoinBuffer; the caller blocks
// until every slot is filled and gets the results in input order.
//
// - Concurrency is bounded by the pool size, not by inputs.len()
// - A panic in f is caught and delivered with that input's slot
// - If the pool shuts down while tasks are queued, the dropped tasks
//   abandon their slots and map() returns Cancelled instead of hanging
//
// The executor is meant to be shared (Arc<ParallelExecutor>) and used for
// many map() calls without re-spawning threads.
// =============================================================================

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::concurrent::pool::panic_message;
use crate::concurrent::{JoinBuffer, WorkerPool};
use crate::error::ExecutorError;

/// A single input whose mapped function panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub message: String,
}

/// Ordered parallel map over a persistent worker pool.
#[derive(Debug)]
pub struct ParallelExecutor {
    pool: WorkerPool,
}

impl ParallelExecutor {
    /// Starts an executor with `threads` workers.
    pub fn new(threads: usize) -> Self {
        Self {
            pool: WorkerPool::new("mapper", threads),
        }
    }

    pub fn threads(&self) -> usize {
        self.pool.size()
    }

    /// Applies `f` to every input in parallel and returns the results in
    /// input order.
    ///
    /// If `f` panics for some input, the first such input (by index) is
    /// reported as `ExecutorError::TaskPanicked`.
    pub fn map<T, R, F>(&self, f: F, inputs: Vec<T>) -> Result<Vec<R>, ExecutorError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.try_map(f, inputs)?
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.map_err(|failure| ExecutorError::TaskPanicked {
                    index,
                    message: failure.message,
                })
            })
            .collect()
    }

    /// Like [`map`](Self::map), but keeps one `Result` per input so the
    /// caller can use the inputs that did succeed.
    pub fn try_map<T, R, F>(
        &self,
        f: F,
        inputs: Vec<T>,
    ) -> Result<Vec<Result<R, TaskFailure>>, ExecutorError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        if self.pool.is_closed() {
            return Err(ExecutorError::Closed);
        }

        let f = Arc::new(f);
        let results = Arc::new(JoinBuffer::new(inputs.len()));

        for (index, input) in inputs.into_iter().enumerate() {
            let f = Arc::clone(&f);
            let slot = SlotGuard {
                results: Arc::clone(&results),
                index,
                filled: false,
            };
            // A rejected task is dropped right away, which abandons its slot
            let _ = self.pool.submit(move || {
                let value = panic::catch_unwind(AssertUnwindSafe(|| (*f)(input))).map_err(
                    |payload| TaskFailure {
                        message: panic_message(payload.as_ref()),
                    },
                );
                slot.fill(value);
            });
        }

        results.await_all()
    }

    /// Stops the worker threads. Later calls to `map` fail with
    /// `ExecutorError::Closed`; calls already waiting get `Cancelled`.
    pub fn close(&self) {
        self.pool.close();
    }
}

// Fills one JoinBuffer slot, or abandons it if the task is dropped unrun.
struct SlotGuard<R> {
    results: Arc<JoinBuffer<R>>,
    index: usize,
    filled: bool,
}

impl<R> SlotGuard<R> {
    fn fill(mut self, value: R) {
        self.results.set(self.index, value);
        self.filled = true;
    }
}

impl<R> Drop for SlotGuard<R> {
    fn drop(&mut self) {
        if !self.filled {
            self.results.abandon(self.index);
        }
    }
}
