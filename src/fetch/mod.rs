// src/fetch/mod.rs
// =============================================================================
// This module contains everything that touches the network or parses pages.
//
// Submodules:
// - http: HttpFetcher, the Fetcher implementation built on reqwest
// - html: HtmlDocument, extracts <a href> links with scraper
// - markdown: MarkdownDocument, extracts [text](url) links with pulldown-cmark
//
// The crawl scheduler only sees the Fetcher / Document traits; this module
// provides the implementations used by the CLI.
// =============================================================================

mod html;
mod http;
mod markdown;

pub use html::{extract_html_links, HtmlDocument};
pub use http::HttpFetcher;
pub use markdown::{extract_markdown_links, MarkdownDocument};

use crate::crawl::Document;

// Picks the Document type for a fetched body
//
// Markdown when the server says so, or when the path ends in .md
// (raw file hosts often serve Markdown as text/plain); HTML otherwise.
pub fn page_document(url: String, content_type: Option<&str>, body: String) -> Box<dyn Document> {
    if is_markdown(&url, content_type) {
        Box::new(MarkdownDocument::new(url, body))
    } else {
        Box::new(HtmlDocument::new(url, body))
    }
}

fn is_markdown(url: &str, content_type: Option<&str>) -> bool {
    if content_type.is_some_and(|ct| ct.trim_start().starts_with("text/markdown")) {
        return true;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown")
}
