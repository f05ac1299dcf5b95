// src/lib.rs
// =============================================================================
// web-crawler: a bounded-concurrency breadth-first crawler.
//
// Modules:
// - cli:        clap definitions for the web-crawler binary
// - concurrent: BoundedQueue, JoinBuffer, WorkerPool, ParallelExecutor, Reducer
// - crawl:      WebCrawler (the scheduler), Fetcher/Document traits, host limits
// - fetch:      HttpFetcher + HTML/Markdown link extraction
// - config:     CrawlerConfig and its validation
// - error:      every error type in the crate
// - logging:    tracing subscriber setup for the CLI
// - report:     human-readable / JSON output of crawl results
// =============================================================================

pub mod cli;
pub mod concurrent;
pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod report;

pub use concurrent::{ParallelExecutor, Reducer, WorkerPool};
pub use config::CrawlerConfig;
pub use crawl::{CrawlResult, Document, Fetcher, WebCrawler};
pub use error::{CrawlError, ExecutorError, ExtractError, FetchError, ReduceError};
pub use fetch::HttpFetcher;
