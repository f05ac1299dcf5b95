// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling starting from a URL, up to a depth limit
// - Two worker pools: one for fetching, one for link extraction
// - Each URL is fetched at most once per crawl
// - A per-host limit on concurrent fetches
// - Failed fetches are recorded and the crawl keeps going
//
// Submodules:
// - fetcher:   the Fetcher / Document traits the scheduler works against
// - host:      per-host admission slots
// - scheduler: WebCrawler, the crawl driver itself
// =============================================================================

mod fetcher;
mod host;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{host_of, Document, Fetcher, SameDomain};
pub use host::{Admission, HostLimiter};
pub use scheduler::{CrawlResult, FrontierEntry, WebCrawler};
