// src/concurrent/pool.rs
// =============================================================================
// A fixed-size pool of long-lived worker threads.
//
// Every worker runs the same loop:
//   1. pop a task from the shared queue (blocks while the queue is empty)
//   2. run it (a panic is caught and logged, the worker keeps going)
//   3. repeat until the queue reports Interrupted
//
// The pool is created once and reused for many submissions, so we never
// pay for spawning a thread per unit of work.
//
// Rust concepts:
// - Box<dyn FnOnce() + Send>: a type-erased closure that can move to
//   another thread and run exactly once
// - thread::Builder: spawn named threads (names show up in logs/debuggers)
// - catch_unwind: stop a panic from tearing down the worker thread
// =============================================================================

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::concurrent::{lock, BoundedQueue};
use crate::error::ExecutorError;

/// A unit of work: a closure that captures its own inputs and outputs.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of worker threads draining one FIFO task queue.
pub struct WorkerPool {
    name: String,
    size: usize,
    queue: Arc<BoundedQueue<Task>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Starts `threads` workers named `{name}-0`, `{name}-1`, ...
    ///
    /// # Panics
    ///
    /// If `threads` is zero or the OS refuses to spawn a thread. Validate
    /// sizes with [`CrawlerConfig::validate`](crate::config::CrawlerConfig::validate)
    /// first when they come from user input.
    pub fn new(name: &str, threads: usize) -> Self {
        assert!(threads > 0, "worker pool '{name}' needs at least one thread");

        let queue: Arc<BoundedQueue<Task>> = Arc::new(BoundedQueue::new());
        let workers = (0..threads)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::Builder::new()
                    .name(format!("{name}-{i}"))
                    .spawn(move || worker_loop(queue))
                    .unwrap_or_else(|e| panic!("failed to spawn worker {name}-{i}: {e}"))
            })
            .collect();

        debug!(pool = name, threads, "worker pool started");

        Self {
            name: name.to_string(),
            size: threads,
            queue,
            workers: Mutex::new(workers),
        }
    }

    /// Number of worker threads (fixed at construction).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Queues a task. Never blocks.
    ///
    /// After [`close`](Self::close) the task is dropped unrun and
    /// `ExecutorError::Closed` is returned.
    pub fn submit<F>(&self, task: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_boxed(Box::new(task))
    }

    pub fn submit_boxed(&self, task: Task) -> Result<(), ExecutorError> {
        self.queue.push(task).map_err(|_| ExecutorError::Closed)
    }

    /// Stops the pool and waits for every worker to exit.
    ///
    /// Tasks still queued are dropped and never start. A task that is
    /// already running is allowed to finish. Safe to call more than once,
    /// and from one of the pool's own workers (that worker is not joined).
    pub fn close(&self) {
        self.queue.close();

        let workers = std::mem::take(&mut *lock(&self.workers));
        if workers.is_empty() {
            return;
        }
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            // worker_loop never panics itself; tasks are caught inside it
            let _ = worker.join();
        }
        debug!(pool = %self.name, "worker pool closed");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("queued", &self.queue.len())
            .field("closed", &self.queue.is_closed())
            .finish()
    }
}

fn worker_loop(queue: Arc<BoundedQueue<Task>>) {
    while let Ok(task) = queue.pop() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            error!(
                worker = thread::current().name().unwrap_or("worker"),
                panic = %panic_message(payload.as_ref()),
                "task panicked"
            );
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_runs_every_submitted_task() {
        let pool = WorkerPool::new("test", 3);
        let (tx, rx) = mpsc::channel();
        for i in 0..20 {
            let tx = tx.clone();
            pool.submit(move || tx.send(i).unwrap()).unwrap();
        }
        let mut seen: Vec<i32> = (0..20).map(|_| rx.recv().unwrap()).collect();
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrency_is_bounded_by_pool_size() {
        let pool = WorkerPool::new("bounded", 2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        for _ in 0..10 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let tx = tx.clone();
            pool.submit(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                running.fetch_sub(1, Ordering::SeqCst);
                tx.send(()).unwrap();
            })
            .unwrap();
        }
        for _ in 0..10 {
            rx.recv().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_worker_survives_panicking_task() {
        let pool = WorkerPool::new("panicky", 1);
        pool.submit(|| panic!("boom")).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.submit(move || tx.send("still alive").unwrap()).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            "still alive"
        );
    }

    #[test]
    fn test_close_drops_queued_tasks_and_rejects_new_ones() {
        let pool = WorkerPool::new("closing", 1);
        let ran = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = mpsc::channel();

        // Keep the only worker busy so the next tasks stay queued
        pool.submit(move || {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
        })
        .unwrap();
        started_rx.recv().unwrap();

        for _ in 0..5 {
            let ran = Arc::clone(&ran);
            pool.submit(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.close();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(pool.is_closed());
        assert_eq!(pool.submit(|| {}), Err(ExecutorError::Closed));

        // second close is a no-op
        pool.close();
    }

    #[test]
    #[should_panic(expected = "at least one thread")]
    fn test_zero_threads_panics() {
        let _ = WorkerPool::new("empty", 0);
    }

    #[test]
    fn test_panic_message_extracts_strings() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
