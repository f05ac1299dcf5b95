// src/crawl/scheduler.rs
// =============================================================================
// Breadth-first crawling with two worker pools.
//
// How one download(url, depth) call works:
// 1. The frontier starts with (url, depth)
// 2. The dispatcher pops frontier entries and submits a fetch task for each
// 3. A fetch task claims its URL (at most once per crawl), waits for a
//    per-host admission slot, and fetches the page
// 4. On success with depth left, it submits an extract task to the
//    extract pool with depth - 1
// 5. An extract task turns the page's links into new frontier entries
// 6. Steps 2-5 repeat until the frontier is empty AND nothing is in flight
//
// Termination:
// - Every queued task carries an InFlight guard; the counter goes up
//   before the task is queued and down when the guard drops
// - A fetch registers its extract task before its own guard drops, so the
//   counter never touches zero while work is still coming
// - The dispatcher checks "frontier empty && in_flight == 0" under the
//   progress lock and otherwise sleeps on a Condvar (no busy spinning)
//
// Shutdown:
// - A guard dropped without finish() means its task never ran (the pool
//   was closed). The crawl is flagged cancelled and download() returns
//   CrawlError::Cancelled instead of waiting forever.
// =============================================================================

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::concurrent::{lock, panic_message, Task, WorkerPool};
use crate::config::CrawlerConfig;
use crate::crawl::fetcher::{host_of, Document, Fetcher};
use crate::crawl::host::{Admission, HostLimiter};
use crate::error::{ConfigError, CrawlError, ExtractError, FetchError};
use crate::fetch::HttpFetcher;

/// A page still to be fetched, with how many more link hops may follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    /// 0 = fetch and record, but do not extract links.
    pub depth: usize,
}

/// What a finished crawl found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    /// Successfully fetched URLs, sorted.
    pub downloaded: Vec<String>,
    /// Failed URLs and why they failed. Disjoint from `downloaded`.
    pub errors: BTreeMap<String, FetchError>,
}

/// A breadth-first crawler with separate fetch and extract pools.
///
/// The pools live as long as the crawler and are shared by every
/// [`download`](Self::download) call. Dropping the crawler closes them.
pub struct WebCrawler {
    fetcher: Arc<dyn Fetcher>,
    fetch_pool: Arc<WorkerPool>,
    extract_pool: Arc<WorkerPool>,
    hosts: Arc<HostLimiter<Task>>,
}

impl WebCrawler {
    // Creates a crawler
    //
    // Parameters:
    //   fetcher: where pages come from
    //   downloaders: fetch pool size
    //   extractors: extract pool size
    //   per_host: max concurrent fetches against one host
    //
    // Panics if any count is zero; use from_config() for user input.
    pub fn new<F: Fetcher>(fetcher: F, downloaders: usize, extractors: usize, per_host: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            fetch_pool: Arc::new(WorkerPool::new("fetch", downloaders)),
            extract_pool: Arc::new(WorkerPool::new("extract", extractors)),
            hosts: Arc::new(HostLimiter::new(per_host)),
        }
    }

    /// Creates a crawler after validating `config`.
    pub fn from_config<F: Fetcher>(fetcher: F, config: &CrawlerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            fetcher,
            config.downloaders,
            config.extractors,
            config.per_host,
        ))
    }

    /// Creates a crawler that fetches over HTTP(S) with [`HttpFetcher`].
    ///
    /// `config.same_domain` is not applied here, since it needs the start
    /// URL; wrap the fetcher in [`SameDomain`](crate::crawl::SameDomain)
    /// and use [`from_config`](Self::from_config) for that.
    pub fn with_http(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::from_config(HttpFetcher::new(config)?, config)
    }

    /// Crawls from `url`, following links up to `depth` hops.
    ///
    /// Individual fetch failures are reported in [`CrawlResult::errors`];
    /// only a shutdown of the crawler makes the whole call fail.
    pub fn download(&self, url: &str, depth: usize) -> Result<CrawlResult, CrawlError> {
        if self.fetch_pool.is_closed() || self.extract_pool.is_closed() {
            let error = CrawlError::Closed;
            warn!(url, reason = error.as_label(), "download refused");
            return Err(error);
        }

        info!(url, depth, "crawl started");
        let crawl = Arc::new(Crawl::new(self));
        crawl.extend_frontier(std::iter::once(FrontierEntry {
            url: url.to_string(),
            depth,
        }));

        let mut progress = lock(&crawl.progress);
        loop {
            if progress.cancelled {
                let error = CrawlError::Cancelled;
                warn!(url, reason = error.as_label(), "crawl cancelled by shutdown");
                return Err(error);
            }
            if let Some(entry) = progress.frontier.pop_front() {
                drop(progress);
                let guard = InFlight::start(&crawl);
                crawl.submit_fetch(entry, guard);
                progress = lock(&crawl.progress);
            } else if progress.in_flight > 0 {
                progress = crawl
                    .progress_changed
                    .wait(progress)
                    .unwrap_or_else(PoisonError::into_inner);
            } else {
                break;
            }
        }
        drop(progress);

        let result = crawl.snapshot();
        info!(
            url,
            downloaded = result.downloaded.len(),
            errors = result.errors.len(),
            "crawl finished"
        );
        Ok(result)
    }

    /// Stops both pools. Later `download` calls fail with `CrawlError::Closed`.
    ///
    /// Fetches still parked behind a busy host are dropped last, once no
    /// fetch worker is left to admit new ones.
    pub fn close(&self) {
        self.fetch_pool.close();
        self.extract_pool.close();
        self.hosts.close();
    }

    pub fn downloaders(&self) -> usize {
        self.fetch_pool.size()
    }

    pub fn extractors(&self) -> usize {
        self.extract_pool.size()
    }

    pub fn per_host(&self) -> usize {
        self.hosts.limit()
    }
}

impl Drop for WebCrawler {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Default)]
struct Progress {
    frontier: VecDeque<FrontierEntry>,
    in_flight: usize,
    cancelled: bool,
}

// State of one download() call, shared by all of its tasks.
struct Crawl {
    fetcher: Arc<dyn Fetcher>,
    fetch_pool: Arc<WorkerPool>,
    extract_pool: Arc<WorkerPool>,
    hosts: Arc<HostLimiter<Task>>,
    visited: Mutex<HashSet<String>>,
    downloaded: Mutex<HashSet<String>>,
    errors: Mutex<HashMap<String, FetchError>>,
    progress: Mutex<Progress>,
    progress_changed: Condvar,
}

impl Crawl {
    fn new(crawler: &WebCrawler) -> Self {
        Self {
            fetcher: Arc::clone(&crawler.fetcher),
            fetch_pool: Arc::clone(&crawler.fetch_pool),
            extract_pool: Arc::clone(&crawler.extract_pool),
            hosts: Arc::clone(&crawler.hosts),
            visited: Mutex::new(HashSet::new()),
            downloaded: Mutex::new(HashSet::new()),
            errors: Mutex::new(HashMap::new()),
            progress: Mutex::new(Progress::default()),
            progress_changed: Condvar::new(),
        }
    }

    // The dedup claim: true for exactly one caller per URL.
    fn try_claim(&self, url: &str) -> bool {
        lock(&self.visited).insert(url.to_string())
    }

    fn record_download(&self, url: &str) {
        lock(&self.downloaded).insert(url.to_string());
    }

    fn record_error(&self, url: &str, error: FetchError) {
        warn!(url, error = %error, "fetch failed");
        lock(&self.errors).insert(url.to_string(), error);
    }

    fn extend_frontier(&self, entries: impl IntoIterator<Item = FrontierEntry>) {
        let mut progress = lock(&self.progress);
        let before = progress.frontier.len();
        progress.frontier.extend(entries);
        let added = progress.frontier.len() > before;
        drop(progress);
        if added {
            self.progress_changed.notify_all();
        }
    }

    fn submit_fetch(self: &Arc<Self>, entry: FrontierEntry, guard: InFlight) {
        let crawl = Arc::clone(self);
        // A rejected task drops its guard, which cancels the crawl
        let _ = self.fetch_pool.submit(move || crawl.claim(entry, guard));
    }

    // Fetch task, part 1: claim the URL and get in line for its host.
    fn claim(self: &Arc<Self>, entry: FrontierEntry, guard: InFlight) {
        if !self.try_claim(&entry.url) {
            guard.finish();
            return;
        }

        let host = match host_of(&entry.url) {
            Ok(host) => host,
            Err(e) => {
                self.record_error(&entry.url, e);
                guard.finish();
                return;
            }
        };

        let crawl = Arc::clone(self);
        let job_host = host.clone();
        let job: Task = Box::new(move || crawl.fetch(&job_host, entry, guard));

        match self.hosts.admit(&host, job) {
            Admission::Granted(job) => job(),
            Admission::Parked => debug!(host = %host, "host busy, fetch parked"),
            // Dropping the job drops its guard, which cancels the crawl
            Admission::Rejected(job) => drop(job),
        }
    }

    // Fetch task, part 2: runs while holding an admission slot for `host`.
    fn fetch(self: &Arc<Self>, host: &str, entry: FrontierEntry, guard: InFlight) {
        debug!(url = %entry.url, depth = entry.depth, "fetching");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.fetcher.fetch(&entry.url)))
            .unwrap_or_else(|payload| {
                Err(FetchError::Other(format!(
                    "fetcher panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        // Pass the slot on before extraction so the host does not sit idle
        if let Some(next) = self.hosts.release(host) {
            let _ = self.fetch_pool.submit_boxed(next);
        }

        match outcome {
            Ok(document) => {
                self.record_download(&entry.url);
                if entry.depth > 0 {
                    self.submit_extract(document, entry.depth - 1);
                }
            }
            Err(e) => self.record_error(&entry.url, e),
        }
        guard.finish();
    }

    fn submit_extract(self: &Arc<Self>, document: Box<dyn Document>, depth: usize) {
        let guard = InFlight::start(self);
        let crawl = Arc::clone(self);
        let _ = self
            .extract_pool
            .submit(move || crawl.extract(document.as_ref(), depth, guard));
    }

    // Extract task: every link becomes a frontier entry, even ones already
    // visited. Dedup happens at claim time.
    fn extract(&self, document: &dyn Document, depth: usize, guard: InFlight) {
        let links = panic::catch_unwind(AssertUnwindSafe(|| document.extract_links()))
            .unwrap_or_else(|payload| {
                Err(ExtractError::Other(format!(
                    "extractor panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        match links {
            Ok(links) => {
                debug!(links = links.len(), depth, "links extracted");
                self.extend_frontier(links.into_iter().map(|url| FrontierEntry { url, depth }));
            }
            Err(e) => warn!(error = %e, "link extraction failed, treating as no links"),
        }
        guard.finish();
    }

    fn snapshot(&self) -> CrawlResult {
        let mut downloaded: Vec<String> = lock(&self.downloaded).iter().cloned().collect();
        downloaded.sort();
        let errors = lock(&self.errors)
            .iter()
            .map(|(url, e)| (url.clone(), e.clone()))
            .collect();
        CrawlResult { downloaded, errors }
    }
}

// Counts one queued or running task of a crawl.
//
// finish() marks normal completion. Dropping the guard without finish()
// means the task was thrown away unrun, so the crawl is cancelled.
struct InFlight {
    crawl: Arc<Crawl>,
    finished: bool,
}

impl InFlight {
    fn start(crawl: &Arc<Crawl>) -> Self {
        lock(&crawl.progress).in_flight += 1;
        Self {
            crawl: Arc::clone(crawl),
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut progress = lock(&self.crawl.progress);
        progress.in_flight -= 1;
        if !self.finished {
            progress.cancelled = true;
        }
        drop(progress);
        self.crawl.progress_changed.notify_all();
    }
}
