// src/config.rs
// =============================================================================
// Crawler configuration.
//
// All knobs live in one struct so the CLI, the HTTP fetcher and the crawler
// agree on them. validate() runs before any thread is spawned: a pool with
// zero workers would never make progress, so it is rejected up front.
// =============================================================================

use std::time::Duration;

use crate::error::ConfigError;

/// Default User-Agent header sent by the HTTP fetcher.
pub const DEFAULT_USER_AGENT: &str = concat!("web-crawler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// Fetch pool size.
    pub downloaders: usize,
    /// Extract pool size.
    pub extractors: usize,
    /// Max concurrent fetches against a single host.
    pub per_host: usize,
    /// Per-request timeout for the HTTP fetcher.
    pub timeout: Duration,
    pub user_agent: String,
    /// Only follow links on the seed URL's domain.
    pub same_domain: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            downloaders: 8,
            extractors: 4,
            per_host: 2,
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            same_domain: false,
        }
    }
}

impl CrawlerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.downloaders == 0 {
            return Err(ConfigError::InvalidDownloaders(self.downloaders));
        }
        if self.extractors == 0 {
            return Err(ConfigError::InvalidExtractors(self.extractors));
        }
        if self.per_host == 0 {
            return Err(ConfigError::InvalidPerHost(self.per_host));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}
