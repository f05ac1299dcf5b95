// src/concurrent/mod.rs
// =============================================================================
// Reusable parallel execution building blocks.
//
// Submodules (leaves first):
// - queue:    BoundedQueue, a blocking FIFO of tasks
// - join:     JoinBuffer, N result slots + "wait until all are set"
// - pool:     WorkerPool, fixed set of threads draining a BoundedQueue
// - executor: ParallelExecutor, ordered parallel map on a WorkerPool
// - reduce:   Reducer, max/min/any/all/count over partitioned lists
//
// The crawler uses WorkerPool directly; the reduction utilities use
// ParallelExecutor. Both share the same queue and thread machinery.
// =============================================================================

mod executor;
mod join;
mod pool;
mod queue;
mod reduce;

pub use executor::{ParallelExecutor, TaskFailure};
pub use join::JoinBuffer;
pub use pool::{Task, WorkerPool};
pub(crate) use pool::panic_message;
pub use queue::BoundedQueue;
pub use reduce::{partition, Reducer};

use std::sync::{Mutex, MutexGuard, PoisonError};

// Locks a mutex, ignoring poisoning.
//
// Panics in user code are caught before they can unwind through our own
// critical sections, and every critical section here leaves the data
// consistent at each step, so the inner value is always usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
