// src/fetch/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// We also use the `url` crate to:
// - Parse and validate URLs
// - Resolve relative URLs to absolute URLs
//
// scraper's Html type is not Send, so HtmlDocument keeps the raw text and
// only parses it inside extract_links(), on an extract worker.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

use crate::crawl::Document;
use crate::error::ExtractError;

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    url: String,
    html: String,
}

impl HtmlDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

impl Document for HtmlDocument {
    fn extract_links(&self) -> Result<Vec<String>, ExtractError> {
        extract_html_links(&self.html, &self.url)
    }
}

// Extracts all links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   base_url: the URL of the page (for resolving relative links)
//
// Returns: every http(s) link as an absolute URL without #fragment
//
// Example:
//   html = "<a href='/docs#intro'>Docs</a>"
//   base_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_html_links(html: &str, base_url: &str) -> Result<Vec<String>, ExtractError> {
    let base = Url::parse(base_url).map_err(|_| ExtractError::InvalidBase(base_url.to_string()))?;

    let selector = Selector::parse("a[href]")
        .map_err(|e| ExtractError::Other(format!("bad selector: {e:?}")))?;

    let document = Html::parse_document(html);

    let links = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_url(&base, href))
        .collect();

    Ok(links)
}

// Resolves a possibly-relative href against `base`
//
// Returns None for anything we cannot crawl:
//   href = "javascript:void(0)" -> None (not HTTP)
//   href = "mailto:me@x.org"    -> None
//   href = "../other"           -> Some("https://example.com/other")
pub(crate) fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    // "page#a" and "page#b" are the same page
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<a href="https://www.rust-lang.org">Rust</a>"#;
        let links = extract_html_links(html, "https://example.com").unwrap();
        assert_eq!(links, vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_resolve_relative_link() {
        let html = r#"<a href="/docs">Docs</a>"#;
        let links = extract_html_links(html, "https://example.com/page").unwrap();
        assert_eq!(links, vec!["https://example.com/docs"]);
    }

    #[test]
    fn test_skip_mailto_and_javascript() {
        let html = r#"
            <a href="mailto:test@example.com">Email</a>
            <a href="javascript:void(0)">Click</a>
            <a href="tel:+123">Call</a>
        "#;
        let links = extract_html_links(html, "https://example.com").unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_fragments_are_stripped() {
        let html = r##"<a href="#top">Top</a><a href="/docs#intro">Docs</a>"##;
        let links = extract_html_links(html, "https://example.com/page").unwrap();
        assert_eq!(
            links,
            vec!["https://example.com/page", "https://example.com/docs"]
        );
    }

    #[test]
    fn test_multiple_links() {
        let html = r#"
            <a href="https://rust-lang.org">Rust</a>
            <a href="/docs">Docs</a>
            <a href="../about">About</a>
            <a>No href</a>
        "#;
        let links = extract_html_links(html, "https://example.com/page/").unwrap();
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_invalid_base_is_an_error() {
        let result = extract_html_links("<a href='/x'>x</a>", "not a url");
        assert_eq!(result, Err(ExtractError::InvalidBase("not a url".to_string())));
    }

    #[test]
    fn test_document_trait() {
        let page = HtmlDocument::new("https://example.com/", r#"<a href="a.html">A</a>"#);
        assert_eq!(
            page.extract_links().unwrap(),
            vec!["https://example.com/a.html"]
        );
    }
}
