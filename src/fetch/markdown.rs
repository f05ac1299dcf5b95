// src/fetch/markdown.rs
// =============================================================================
// This module extracts links from Markdown documents (README.md, docs/*.md).
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows CommonMark
// - Is fast and memory-efficient (it's a streaming parser)
//
// Unlike a link *checker*, a crawler wants relative links too, so every
// destination is resolved against the document's own URL.
// =============================================================================

use pulldown_cmark::{Event, Parser, Tag};
use url::Url;

use crate::crawl::Document;
use crate::error::ExtractError;
use crate::fetch::html::resolve_url;

/// A fetched Markdown document.
#[derive(Debug, Clone)]
pub struct MarkdownDocument {
    url: String,
    markdown: String,
}

impl MarkdownDocument {
    pub fn new(url: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markdown: markdown.into(),
        }
    }
}

impl Document for MarkdownDocument {
    fn extract_links(&self) -> Result<Vec<String>, ExtractError> {
        extract_markdown_links(&self.markdown, &self.url)
    }
}

// Extracts all crawlable links from Markdown text
//
// Example input:
//   "Check out [Rust](https://www.rust-lang.org) and [docs](./docs/)"
//   base_url = "https://example.com/README.md"
//
// Example output:
//   ["https://www.rust-lang.org/", "https://example.com/docs/"]
pub fn extract_markdown_links(markdown: &str, base_url: &str) -> Result<Vec<String>, ExtractError> {
    let base = Url::parse(base_url).map_err(|_| ExtractError::InvalidBase(base_url.to_string()))?;

    let links = Parser::new(markdown)
        .filter_map(|event| match event {
            // In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
            Event::Start(Tag::Link(_link_type, dest_url, _title)) => resolve_url(&base, &dest_url),
            _ => None,
        })
        .collect();

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/project/README.md";

    #[test]
    fn test_extract_simple_link() {
        let markdown = "Check out [Rust](https://www.rust-lang.org)!";
        let links = extract_markdown_links(markdown, BASE).unwrap();
        assert_eq!(links, vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_extract_multiple_links() {
        let markdown = r#"
# Resources

- [Rust](https://www.rust-lang.org)
- [Cargo](https://doc.rust-lang.org/cargo/)
- [Docs](https://doc.rust-lang.org/)
        "#;
        let links = extract_markdown_links(markdown, BASE).unwrap();
        assert_eq!(links.len(), 3);
        assert!(links.contains(&"https://doc.rust-lang.org/cargo/".to_string()));
    }

    #[test]
    fn test_skip_mailto_links() {
        let markdown = "Email me at [email](mailto:test@example.com)";
        let links = extract_markdown_links(markdown, BASE).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_relative_links_are_resolved() {
        let markdown = "See [docs](./docs/GUIDE.md) and [up](../LICENSE)";
        let links = extract_markdown_links(markdown, BASE).unwrap();
        assert_eq!(
            links,
            vec![
                "https://example.com/project/docs/GUIDE.md",
                "https://example.com/LICENSE"
            ]
        );
    }

    #[test]
    fn test_document_trait() {
        let doc = MarkdownDocument::new(BASE, "[a](a.md)");
        assert_eq!(
            doc.extract_links().unwrap(),
            vec!["https://example.com/project/a.md"]
        );
    }
}
