// src/crawl/testing.rs
// In-memory Fetcher used by the crawl tests: a fixed link graph with
// optional failures, latency, jitter and a per-host concurrency probe.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::crawl::fetcher::{host_of, Document, Fetcher};
use crate::error::{ExtractError, FetchError};

#[derive(Default)]
pub(crate) struct GraphFetcher {
    links: HashMap<String, Vec<String>>,
    failing: HashMap<String, FetchError>,
    broken_extract: HashSet<String>,
    panicking: HashSet<String>,
    latency: Duration,
    jitter: Option<Duration>,
    rng: Mutex<u64>,
    fetched: Mutex<HashMap<String, usize>>,
    started: Mutex<Vec<String>>,
    total: AtomicUsize,
    extracted: Arc<AtomicUsize>,
    // host -> (running now, peak)
    probe: Mutex<HashMap<String, (usize, usize)>>,
}

impl GraphFetcher {
    pub(crate) fn new() -> Self {
        Self {
            rng: Mutex::new(0x9E37_79B9_7F4A_7C15),
            ..Self::default()
        }
    }

    pub(crate) fn link(mut self, from: &str, to: &[&str]) -> Self {
        self.links
            .insert(from.to_string(), to.iter().map(|s| s.to_string()).collect());
        self
    }

    pub(crate) fn fail(mut self, url: &str, error: FetchError) -> Self {
        self.failing.insert(url.to_string(), error);
        self
    }

    pub(crate) fn broken_extract(mut self, url: &str) -> Self {
        self.broken_extract.insert(url.to_string());
        self
    }

    pub(crate) fn panic_on(mut self, url: &str) -> Self {
        self.panicking.insert(url.to_string());
        self
    }

    pub(crate) fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn jitter(mut self, max: Duration) -> Self {
        self.jitter = Some(max);
        self
    }

    /// Per-URL fetch counts since the last call; resets them.
    pub(crate) fn take_fetch_counts(&self) -> HashMap<String, usize> {
        std::mem::take(&mut *self.fetched.lock().unwrap())
    }

    /// URLs in the order their fetches started.
    pub(crate) fn start_order(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub(crate) fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub(crate) fn extractions(&self) -> usize {
        self.extracted.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_concurrency(&self, host: &str) -> usize {
        self.probe
            .lock()
            .unwrap()
            .get(host)
            .map(|&(_, peak)| peak)
            .unwrap_or(0)
    }

    // xorshift64: deterministic sequence, different delay per call
    fn next_delay(&self) -> Duration {
        let Some(max) = self.jitter else {
            return self.latency;
        };
        let mut state = self.rng.lock().unwrap();
        *state ^= *state << 13;
        *state ^= *state >> 7;
        *state ^= *state << 17;
        let max_nanos = max.as_nanos().max(1) as u64;
        self.latency + Duration::from_nanos(*state % max_nanos)
    }

    fn enter(&self, host: &str) {
        let mut probe = self.probe.lock().unwrap();
        let entry = probe.entry(host.to_string()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = entry.1.max(entry.0);
    }

    fn leave(&self, host: &str) {
        let mut probe = self.probe.lock().unwrap();
        if let Some(entry) = probe.get_mut(host) {
            entry.0 -= 1;
        }
    }
}

impl Fetcher for GraphFetcher {
    fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        *self
            .fetched
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(url.to_string());

        let host = host_of(url)?;
        self.enter(&host);
        let delay = self.next_delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.leave(&host);

        if self.panicking.contains(url) {
            panic!("fetcher exploded on {url}");
        }
        if let Some(error) = self.failing.get(url) {
            return Err(error.clone());
        }
        Ok(Box::new(GraphDocument {
            links: self.links.get(url).cloned().unwrap_or_default(),
            broken: self.broken_extract.contains(url),
            extracted: Arc::clone(&self.extracted),
        }))
    }
}

struct GraphDocument {
    links: Vec<String>,
    broken: bool,
    extracted: Arc<AtomicUsize>,
}

impl Document for GraphDocument {
    fn extract_links(&self) -> Result<Vec<String>, ExtractError> {
        self.extracted.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(ExtractError::Other("unparseable page".to_string()));
        }
        Ok(self.links.clone())
    }
}
