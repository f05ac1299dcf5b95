// src/error.rs
// =============================================================================
// Error types for the whole crate.
//
// Every layer gets its own enum so callers can tell them apart:
// - QueueError:    a blocking pop was interrupted by shutdown
// - ExecutorError: a parallel map could not deliver its results
// - ReduceError:   a reduction had nothing to reduce (or bad arguments)
// - FetchError:    one URL failed to download (recorded, crawl continues)
// - ExtractError:  link extraction failed (treated as "no links")
// - CrawlError:    a whole download() call could not complete
// - ConfigError:   invalid pool sizes / limits before anything starts
//
// We use `thiserror` to derive Display and std::error::Error.
// The binary wraps all of these in anyhow::Error.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

/// Errors raised by [`BoundedQueue`](crate::concurrent::BoundedQueue).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed while (or before) the caller waited for a task.
    #[error("queue interrupted by shutdown")]
    Interrupted,
    /// A task was pushed after the queue was closed; the task was dropped.
    #[error("queue is closed")]
    Closed,
}

/// Errors raised by the worker pool and the parallel executor.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// The pool was closed before the call was made.
    #[error("executor is closed")]
    Closed,
    /// The pool was closed while results were still outstanding.
    #[error("executor was shut down before all results were produced")]
    Cancelled,
    /// The mapped function panicked for the input at `index`.
    #[error("task for input #{index} panicked: {message}")]
    TaskPanicked {
        /// Position of the failing input.
        index: usize,
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl ExecutorError {
    /// Short snake_case label for the `reason` log field.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorError::Closed => "executor_closed",
            ExecutorError::Cancelled => "executor_cancelled",
            ExecutorError::TaskPanicked { .. } => "executor_task_panicked",
        }
    }
}

/// Errors raised by [`Reducer`](crate::concurrent::Reducer).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// max/min over an empty list has no identity value.
    #[error("cannot reduce an empty list")]
    EmptyInput,
    /// Zero partitions were requested.
    #[error("thread count must be at least 1")]
    InvalidThreads,
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Why a single URL could not be downloaded.
///
/// Recorded per URL in [`CrawlResult::errors`](crate::crawl::CrawlResult);
/// never aborts the crawl.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    /// Server answered with a non-success status code.
    #[error("HTTP {0}")]
    Status(u16),
    /// Request timed out.
    #[error("request timed out")]
    Timeout,
    /// Redirect loop or too many redirects.
    #[error("too many redirects")]
    TooManyRedirects,
    /// Hostname could not be resolved.
    #[error("could not resolve hostname")]
    Dns,
    /// TLS / certificate problem.
    #[error("TLS certificate error")]
    Tls,
    /// Connection refused, reset, unreachable...
    #[error("connection failed")]
    Connect,
    /// URL could not be parsed or has no host.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Response body could not be read.
    #[error("failed to read body: {0}")]
    Body(String),
    #[error("{0}")]
    Other(String),
}

/// Link extraction failed for an already fetched document.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The document's own URL is unusable as a base for relative links.
    #[error("invalid base URL '{0}'")]
    InvalidBase(String),
    #[error("{0}")]
    Other(String),
}

/// A `download()` call that could not run to completion.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    /// `download()` was called after `close()`.
    #[error("crawler is closed")]
    Closed,
    /// A pool was shut down while the crawl was still running.
    #[error("crawl cancelled by shutdown; partial results discarded")]
    Cancelled,
}

impl CrawlError {
    /// Short snake_case label for the `reason` log field.
    pub fn as_label(&self) -> &'static str {
        match self {
            CrawlError::Closed => "crawl_closed",
            CrawlError::Cancelled => "crawl_cancelled",
        }
    }
}

/// Invalid crawler configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("number of downloaders must be greater than 0, got {0}")]
    InvalidDownloaders(usize),
    #[error("number of extractors must be greater than 0, got {0}")]
    InvalidExtractors(usize),
    #[error("per-host limit must be greater than 0, got {0}")]
    InvalidPerHost(usize),
    #[error("timeout must be greater than 0 seconds")]
    InvalidTimeout,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP 404");
        assert_eq!(
            FetchError::InvalidUrl("nope".into()).to_string(),
            "invalid URL: nope"
        );
    }

    #[test]
    fn test_fetch_error_serializes_with_kind() {
        let json = serde_json::to_value(FetchError::Status(500)).unwrap();
        assert_eq!(json["kind"], "status");
        assert_eq!(json["detail"], 500);

        let json = serde_json::to_value(FetchError::Timeout).unwrap();
        assert_eq!(json["kind"], "timeout");
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(CrawlError::Cancelled.as_label(), "crawl_cancelled");
        assert_eq!(ExecutorError::Closed.as_label(), "executor_closed");
    }
}
