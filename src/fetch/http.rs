// src/fetch/http.rs
// =============================================================================
// The real Fetcher: downloads pages over HTTP(S) with reqwest.
//
// The crawler runs fetches on plain OS threads (the fetch pool), while
// reqwest's client is async. HttpFetcher owns a small tokio runtime and
// every fetch worker calls runtime.block_on(...) on it. Runtime::block_on
// takes &self, so many workers can block on it at the same time, and they
// all share one connection pool through the cloned Client.
//
// Error mapping follows the same categories we use for link checking:
// timeouts, redirect loops, DNS failures, TLS errors, connect errors and
// non-2xx status codes each get their own FetchError variant.
//
// Rust concepts:
// - async fn + block_on: running async code from synchronous threads
// - map_err: converting one error type into another
// =============================================================================

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::runtime::{Builder, Runtime};

use crate::config::CrawlerConfig;
use crate::crawl::{Document, Fetcher};
use crate::error::{ConfigError, FetchError};
use crate::fetch::page_document;

// How many redirects we follow before giving up (same as a link check)
const MAX_REDIRECTS: usize = 5;

/// Fetches pages over HTTP(S).
pub struct HttpFetcher {
    client: Client,
    runtime: Runtime,
}

impl HttpFetcher {
    // Builds the HTTP client and its runtime from the crawler config
    //
    // Uses: config.timeout (per request) and config.user_agent
    pub fn new(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("http-io")
            .enable_all()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, runtime })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        self.runtime.block_on(fetch_page(&self.client, url))
    }
}

// Fetches a web page and wraps it in the right Document type
//
// Relative links are later resolved against the *final* URL, after
// redirects, which is what a browser does too.
async fn fetch_page(client: &Client, url: &str) -> Result<Box<dyn Document>, FetchError> {
    let response = client.get(url).send().await.map_err(categorize_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Body(e.to_string()))?;

    Ok(page_document(final_url, content_type.as_deref(), body))
}

// Categorizes reqwest errors into FetchError variants
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
fn categorize_error(error: reqwest::Error) -> FetchError {
    let error_string = error.to_string().to_lowercase();

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_builder() {
        // reqwest refuses to even build the request: bad URL or scheme
        FetchError::InvalidUrl(error.to_string())
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            FetchError::Dns
        } else {
            FetchError::Connect
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        FetchError::Tls
    } else {
        FetchError::Other(error.to_string())
    }
}
