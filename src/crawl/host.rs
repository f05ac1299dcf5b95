// src/crawl/host.rs
// =============================================================================
// Per-host admission control.
//
// Each host gets a budget of `limit` concurrent fetches. A fetch that finds
// its host busy does NOT block a worker thread waiting for a slot; instead
// its continuation is parked in the host's FIFO and the worker goes back to
// the pool. When a running fetch releases its slot, the slot is handed
// straight to the oldest parked continuation, which the caller resubmits
// to the fetch pool.
//
// Bookkeeping:
// - gates live in a DashMap, so hosts in different shards never contend
// - a gate is removed as soon as it is idle (no slot taken, nothing parked),
//   so the map only holds hosts with fetches in progress
// - close() drops every gate and parked job, and refuses new ones; a parked
//   job owns a handle to its crawl, and dropping it lets that crawl go away
// =============================================================================

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

#[derive(Debug)]
struct Gate<J> {
    active: usize,
    parked: VecDeque<J>,
}

impl<J> Gate<J> {
    fn is_idle(&self) -> bool {
        self.active == 0 && self.parked.is_empty()
    }
}

/// Outcome of asking for an admission slot.
#[derive(Debug)]
pub enum Admission<J> {
    /// A slot was taken; run the job now and call `release` afterwards.
    Granted(J),
    /// The host is at its limit; the job was parked.
    Parked,
    /// The limiter was closed. The job is handed back unrun.
    Rejected(J),
}

/// Admission slots per host, shared by every fetch of one crawler.
#[derive(Debug)]
pub struct HostLimiter<J> {
    limit: usize,
    gates: DashMap<String, Gate<J>>,
    closed: AtomicBool,
}

impl<J> HostLimiter<J> {
    /// # Panics
    ///
    /// If `limit` is zero.
    pub fn new(limit: usize) -> Self {
        assert!(limit > 0, "per-host limit must be at least 1");
        Self {
            limit,
            gates: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Takes a slot for `host` if one is free, otherwise parks `job`.
    pub fn admit(&self, host: &str, job: J) -> Admission<J> {
        let mut gate = self.gates.entry(host.to_string()).or_insert_with(|| Gate {
            active: 0,
            parked: VecDeque::new(),
        });
        // Checked under the shard lock, so close() cannot miss this gate
        if self.closed.load(Ordering::SeqCst) {
            let idle = gate.is_idle();
            drop(gate);
            if idle {
                self.gates.remove_if(host, |_, gate| gate.is_idle());
            }
            return Admission::Rejected(job);
        }
        if gate.active < self.limit {
            gate.active += 1;
            Admission::Granted(job)
        } else {
            gate.parked.push_back(job);
            Admission::Parked
        }
    }

    /// Gives back a slot for `host`.
    ///
    /// If a job is parked, the slot passes to it and the job is returned;
    /// the caller must run (or resubmit) it and release again afterwards.
    pub fn release(&self, host: &str) -> Option<J> {
        let mut gate = self.gates.get_mut(host)?;
        if let Some(job) = gate.parked.pop_front() {
            return Some(job);
        }
        gate.active = gate.active.saturating_sub(1);
        let idle = gate.is_idle();
        // The shard lock must be released before remove_if takes it again
        drop(gate);
        if idle {
            self.gates.remove_if(host, |_, gate| gate.is_idle());
        }
        None
    }

    /// Refuses further admissions, forgets every gate and drops every
    /// parked job. A `release` for a slot granted before the close is a
    /// no-op. Safe to call more than once.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);

        let hosts: Vec<String> = self.gates.iter().map(|gate| gate.key().clone()).collect();
        let mut dropped = Vec::new();
        for host in hosts {
            if let Some((_, gate)) = self.gates.remove(&host) {
                dropped.extend(gate.parked);
            }
        }
        // Parked jobs may own the last handle to a crawl; drop them with no
        // shard locked
        drop(dropped);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fetches currently holding a slot for `host`.
    pub fn active(&self, host: &str) -> usize {
        self.gates.get(host).map_or(0, |gate| gate.active)
    }

    /// Jobs waiting for a slot on `host`.
    pub fn parked(&self, host: &str) -> usize {
        self.gates.get(host).map_or(0, |gate| gate.parked.len())
    }

    /// Hosts with a slot taken or a job parked.
    pub fn tracked_hosts(&self) -> usize {
        self.gates.len()
    }
}
