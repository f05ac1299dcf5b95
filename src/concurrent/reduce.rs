// src/concurrent/reduce.rs
// =============================================================================
// Scalar reductions (max / min / any / all / count) over a list, in parallel.
//
// Strategy:
// 1. Split the list into min(threads, n) contiguous, size-balanced parts
//    (the first n % threads parts get one extra element)
// 2. Reduce every part serially, all parts in parallel on the executor
// 3. Combine the partial results with an associative reducer
//
// Empty input:
// - any / all  -> true
// - count      -> 0
// - max / min  -> ReduceError::EmptyInput (no identity value exists)
// =============================================================================

use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

use tracing::warn;

use crate::concurrent::ParallelExecutor;
use crate::error::ReduceError;

// Splits 0..n into min(k, n) contiguous ranges whose lengths differ by at
// most one. The longer ranges come first.
//
// Example: partition(7, 3) = [0..3, 3..5, 5..7]
pub fn partition(n: usize, k: usize) -> Vec<Range<usize>> {
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let parts = k.min(n);
    let base = n / parts;
    let extra = n % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Parallel reductions backed by a shared [`ParallelExecutor`].
#[derive(Debug, Clone)]
pub struct Reducer {
    executor: Arc<ParallelExecutor>,
}

impl Reducer {
    pub fn new(executor: Arc<ParallelExecutor>) -> Self {
        Self { executor }
    }

    /// Reduces `values` with `partial` per part and `combine` across parts.
    ///
    /// `combine` must be associative; parts are combined left to right.
    /// Returns `Ok(None)` for empty input.
    pub fn reduce<T, R, P, C>(
        &self,
        threads: usize,
        values: Vec<T>,
        partial: P,
        combine: C,
    ) -> Result<Option<R>, ReduceError>
    where
        T: Send + 'static,
        R: Send + 'static,
        P: Fn(Vec<T>) -> R + Send + Sync + 'static,
        C: Fn(R, R) -> R,
    {
        if threads == 0 {
            return Err(ReduceError::InvalidThreads);
        }
        if values.is_empty() {
            return Ok(None);
        }

        let parts = split_owned(values, threads);
        let partials = self.executor.map(partial, parts).map_err(|e| {
            warn!(reason = e.as_label(), error = %e, "parallel reduction failed");
            e
        })?;
        Ok(partials.into_iter().reduce(combine))
    }

    pub fn maximum<T, C>(&self, threads: usize, values: Vec<T>, cmp: C) -> Result<T, ReduceError>
    where
        T: Send + 'static,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.extreme(threads, values, cmp, Ordering::Greater)
    }

    pub fn minimum<T, C>(&self, threads: usize, values: Vec<T>, cmp: C) -> Result<T, ReduceError>
    where
        T: Send + 'static,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.extreme(threads, values, cmp, Ordering::Less)
    }

    /// `true` if every value matches, and for an empty list.
    pub fn all<T, P>(&self, threads: usize, values: Vec<T>, predicate: P) -> Result<bool, ReduceError>
    where
        T: Send + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let found = self.reduce(
            threads,
            values,
            move |part: Vec<T>| part.iter().all(&predicate),
            |a, b| a && b,
        )?;
        Ok(found.unwrap_or(true))
    }

    /// `true` if some value matches. An empty list also yields `true`.
    pub fn any<T, P>(&self, threads: usize, values: Vec<T>, predicate: P) -> Result<bool, ReduceError>
    where
        T: Send + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let found = self.reduce(
            threads,
            values,
            move |part: Vec<T>| part.iter().any(&predicate),
            |a, b| a || b,
        )?;
        Ok(found.unwrap_or(true))
    }

    pub fn count<T, P>(&self, threads: usize, values: Vec<T>, predicate: P) -> Result<usize, ReduceError>
    where
        T: Send + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let counted = self.reduce(
            threads,
            values,
            move |part: Vec<T>| part.iter().filter(|v| predicate(v)).count(),
            |a, b| a + b,
        )?;
        Ok(counted.unwrap_or(0))
    }

    // Shared body of maximum/minimum: keep the value that compares as `wanted`
    // against the current best. Ties keep the earlier value.
    fn extreme<T, C>(
        &self,
        threads: usize,
        values: Vec<T>,
        cmp: C,
        wanted: Ordering,
    ) -> Result<T, ReduceError>
    where
        T: Send + 'static,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let cmp = Arc::new(cmp);
        let pick = {
            let cmp = Arc::clone(&cmp);
            move |best: T, next: T| {
                if cmp(&next, &best) == wanted {
                    next
                } else {
                    best
                }
            }
        };
        let per_part = pick.clone();

        let best = self.reduce(
            threads,
            values,
            move |part: Vec<T>| part.into_iter().reduce(&per_part),
            |a, b| match (a, b) {
                (Some(a), Some(b)) => Some(pick(a, b)),
                (a, b) => a.or(b),
            },
        )?;
        best.flatten().ok_or(ReduceError::EmptyInput)
    }
}

// Moves `values` into size-balanced owned parts following `partition`.
fn split_owned<T>(values: Vec<T>, threads: usize) -> Vec<Vec<T>> {
    let ranges = partition(values.len(), threads);
    let mut rest = values.into_iter();
    ranges
        .into_iter()
        .map(|range| rest.by_ref().take(range.len()).collect())
        .collect()
}
