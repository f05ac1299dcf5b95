// src/main.rs
// =============================================================================
// This is the entry point of the CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr)
// 3. Build the HTTP fetcher and the crawler from the arguments
// 4. Crawl, then print the downloaded pages and the errors
//
// Exit codes:
//   0 = crawl finished (even if some pages failed)
//   1 = the crawl itself could not run (bad URL, cancelled, ...)
//   2 = invalid arguments (printed by clap)
// =============================================================================

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use web_crawler::cli::{Cli, Commands, CrawlArgs};
use web_crawler::concurrent::{ParallelExecutor, Reducer};
use web_crawler::crawl::{SameDomain, WebCrawler};
use web_crawler::fetch::HttpFetcher;
use web_crawler::logging::init_logging;
use web_crawler::report;

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

fn run() -> Result<()> {
    // clap prints usage and exits with code 2 on malformed arguments
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Crawl(args) => handle_crawl(&args),
    }
}

// Handles the 'crawl' subcommand
fn handle_crawl(args: &CrawlArgs) -> Result<()> {
    let config = args.to_config();
    config.validate()?;

    let crawler = if config.same_domain {
        let restricted = SameDomain::new(HttpFetcher::new(&config)?, &args.url)
            .with_context(|| format!("invalid start URL '{}'", args.url))?;
        info!(domain = restricted.domain(), "restricting crawl to one domain");
        WebCrawler::from_config(restricted, &config)?
    } else {
        WebCrawler::with_http(&config)?
    };

    let result = crawler
        .download(&args.url, args.depth)
        .with_context(|| format!("crawl of {} did not complete", args.url))?;
    crawler.close();

    let summary = if args.summary {
        let executor = Arc::new(ParallelExecutor::new(config.extractors));
        let reducer = Reducer::new(Arc::clone(&executor));
        let summary = report::summarize(&reducer, config.extractors, &result)?;
        executor.close();
        Some(summary)
    } else {
        None
    };

    let stdout = io::stdout();
    report::write_results(&mut stdout.lock(), &result, summary.as_ref(), args.json)?;
    Ok(())
}
