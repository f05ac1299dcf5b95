// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Usage:
//   web-crawler crawl <URL> <DEPTH> <DOWNLOADERS> <EXTRACTORS> <PER_HOST> [flags]
// =============================================================================

use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};

use crate::config::{CrawlerConfig, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "web-crawler",
    version,
    about = "Crawl a website breadth-first with bounded concurrency",
    long_about = "web-crawler downloads a page, follows its links up to a given depth and \
                  reports which pages were downloaded and which failed. Fetching and link \
                  extraction run on separate thread pools, and a per-host limit keeps the \
                  crawler from hammering a single server."
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from a URL
    ///
    /// Example: web-crawler crawl https://example.com 2 8 4 2
    Crawl(CrawlArgs),
}

#[derive(clap::Args, Debug)]
pub struct CrawlArgs {
    /// Start URL (e.g., https://example.com)
    pub url: String,

    /// How many link hops to follow from the start page
    ///
    /// Depth 0 = just the starting page
    /// Depth 1 = starting page + all pages it links to
    pub depth: usize,

    /// Number of fetch threads
    #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub downloaders: usize,

    /// Number of link extraction threads
    #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub extractors: usize,

    /// Max concurrent fetches against one host
    #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub per_host: usize,

    /// Output results in JSON format instead of a report
    #[arg(long)]
    pub json: bool,

    /// Append a summary computed over the downloaded pages
    #[arg(long)]
    pub summary: bool,

    /// Only follow links that stay on the start URL's domain
    #[arg(long)]
    pub same_domain: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// User-Agent header to send
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl CrawlArgs {
    pub fn to_config(&self) -> CrawlerConfig {
        CrawlerConfig {
            downloaders: self.downloaders,
            extractors: self.extractors,
            per_host: self.per_host,
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
            same_domain: self.same_domain,
        }
    }
}
