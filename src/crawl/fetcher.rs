// src/crawl/fetcher.rs
// =============================================================================
// The boundary between the crawl scheduler and the outside world.
//
// The scheduler never talks to the network itself. It only knows two things:
// - a Fetcher turns a URL into a Document (or a FetchError)
// - a Document turns itself into a list of outbound URLs
//
// The real HTTP implementation lives in crate::fetch; tests plug in an
// in-memory link graph instead.
// =============================================================================

use std::sync::Arc;

use url::Url;

use crate::error::{ExtractError, FetchError};

/// Downloads one URL. Called concurrently from every fetch worker.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError>;
}

/// A fetched resource that can list its outbound links.
///
/// Extraction runs on the extract pool, so it may do real work (parsing).
pub trait Document: Send + 'static {
    fn extract_links(&self) -> Result<Vec<String>, ExtractError>;
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        (**self).fetch(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        (**self).fetch(url)
    }
}

// Wraps another Fetcher and drops extracted links that leave the seed's
// domain. This keeps a crawl on one website, like `--same-domain` asks.
pub struct SameDomain<F> {
    inner: F,
    domain: String,
}

impl<F: Fetcher> SameDomain<F> {
    /// Restricts `inner` to the domain of `seed`.
    pub fn new(inner: F, seed: &str) -> Result<Self, FetchError> {
        let domain = host_of(seed)?;
        Ok(Self { inner, domain })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl<F: Fetcher> Fetcher for SameDomain<F> {
    fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        let document = self.inner.fetch(url)?;
        Ok(Box::new(SameDomainDocument {
            inner: document,
            domain: self.domain.clone(),
        }))
    }
}

struct SameDomainDocument {
    inner: Box<dyn Document>,
    domain: String,
}

impl Document for SameDomainDocument {
    fn extract_links(&self) -> Result<Vec<String>, ExtractError> {
        let links = self.inner.extract_links()?;
        Ok(links
            .into_iter()
            .filter(|link| host_of(link).is_ok_and(|host| host == self.domain))
            .collect())
    }
}

/// Returns the host part of `url`, the key used for per-host throttling.
pub fn host_of(url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| FetchError::InvalidUrl(format!("{url}: URL has no host")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<&'static str>);

    impl Document for Fixed {
        fn extract_links(&self) -> Result<Vec<String>, ExtractError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FixedFetcher;

    impl Fetcher for FixedFetcher {
        fn fetch(&self, _url: &str) -> Result<Box<dyn Document>, FetchError> {
            Ok(Box::new(Fixed(vec![
                "https://example.com/a",
                "https://other.org/b",
                "https://example.com/c",
                "not a url",
            ])))
        }
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://example.com/x?y").unwrap(), "example.com");
        assert_eq!(host_of("http://127.0.0.1:8080/").unwrap(), "127.0.0.1");
        assert!(matches!(host_of("nope"), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(
            host_of("mailto:someone@example.com"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_same_domain_filters_links() {
        let fetcher = SameDomain::new(FixedFetcher, "https://example.com/").unwrap();
        assert_eq!(fetcher.domain(), "example.com");
        let links = fetcher
            .fetch("https://example.com/")
            .unwrap()
            .extract_links()
            .unwrap();
        assert_eq!(links, vec!["https://example.com/a", "https://example.com/c"]);
    }

    #[test]
    fn test_same_domain_rejects_bad_seed() {
        assert!(SameDomain::new(FixedFetcher, "::::").is_err());
    }
}
