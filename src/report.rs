// src/report.rs
// =============================================================================
// Turns a CrawlResult into output for humans (a report) or machines (JSON).
//
// The optional summary is computed in parallel with the Reducer:
// - count:   how many downloaded pages were served over https
// - maximum: the page with the most path segments (the "deepest" page)
// - reduce:  the set of distinct hosts, merged partition by partition
// =============================================================================

use std::collections::BTreeSet;
use std::io::{self, Write};

use serde::Serialize;
use url::Url;

use crate::concurrent::Reducer;
use crate::crawl::{host_of, CrawlResult};
use crate::error::ReduceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub downloaded: usize,
    pub failed: usize,
    pub https_pages: usize,
    pub distinct_hosts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepest_page: Option<String>,
}

// Everything we print with --json
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    result: &'a CrawlResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Summary>,
}

fn path_depth(url: &str) -> usize {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().map(|s| s.filter(|seg| !seg.is_empty()).count()))
        .unwrap_or(0)
}

// Computes the summary, splitting the downloaded list into `threads` parts
pub fn summarize(reducer: &Reducer, threads: usize, result: &CrawlResult) -> Result<Summary, ReduceError> {
    let pages = result.downloaded.clone();

    let https_pages = reducer.count(threads, pages.clone(), |url: &String| {
        url.starts_with("https://")
    })?;

    let deepest_page = match reducer.maximum(threads, pages.clone(), |a: &String, b: &String| {
        path_depth(a).cmp(&path_depth(b))
    }) {
        Ok(page) => Some(page),
        Err(ReduceError::EmptyInput) => None,
        Err(e) => return Err(e),
    };

    let hosts = reducer.reduce(
        threads,
        pages,
        |part: Vec<String>| {
            part.iter()
                .filter_map(|url| host_of(url).ok())
                .collect::<BTreeSet<String>>()
        },
        |mut a, b| {
            a.extend(b);
            a
        },
    )?;

    Ok(Summary {
        downloaded: result.downloaded.len(),
        failed: result.errors.len(),
        https_pages,
        distinct_hosts: hosts.map_or(0, |h| h.len()),
        deepest_page,
    })
}

// Prints the results either as a report or as JSON
pub fn write_results(
    out: &mut impl Write,
    result: &CrawlResult,
    summary: Option<&Summary>,
    json: bool,
) -> io::Result<()> {
    if json {
        let report = JsonReport { result, summary };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        write_report(out, result)?;
        if let Some(summary) = summary {
            write_summary(out, summary)?;
        }
    }
    Ok(())
}

fn write_report(out: &mut impl Write, result: &CrawlResult) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(out, "Downloaded successfully ({}):", result.downloaded.len())?;
    for url in &result.downloaded {
        writeln!(out, "\t{url}")?;
    }
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(out, "Errors occurred while downloading ({}):", result.errors.len())?;
    for (url, error) in &result.errors {
        writeln!(out, "\t{url}: {error}")?;
    }
    Ok(())
}

fn write_summary(out: &mut impl Write, summary: &Summary) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(out, "Summary:")?;
    writeln!(out, "   Downloaded: {}", summary.downloaded)?;
    writeln!(out, "   Failed: {}", summary.failed)?;
    writeln!(out, "   Over https: {}", summary.https_pages)?;
    writeln!(out, "   Distinct hosts: {}", summary.distinct_hosts)?;
    if let Some(page) = &summary.deepest_page {
        writeln!(out, "   Deepest page: {page}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrent::ParallelExecutor;
    use crate::error::FetchError;
    use std::sync::Arc;

    fn sample() -> CrawlResult {
        let mut result = CrawlResult {
            downloaded: vec![
                "http://a.org/".to_string(),
                "https://a.org/docs/guide/intro".to_string(),
                "https://b.org/x".to_string(),
            ],
            ..CrawlResult::default()
        };
        result
            .errors
            .insert("https://c.org/".to_string(), FetchError::Status(500));
        result
    }

    #[test]
    fn test_summarize() {
        let reducer = Reducer::new(Arc::new(ParallelExecutor::new(2)));
        let summary = summarize(&reducer, 2, &sample()).unwrap();
        assert_eq!(
            summary,
            Summary {
                downloaded: 3,
                failed: 1,
                https_pages: 2,
                distinct_hosts: 2,
                deepest_page: Some("https://a.org/docs/guide/intro".to_string()),
            }
        );
    }

    #[test]
    fn test_summarize_empty_result() {
        let reducer = Reducer::new(Arc::new(ParallelExecutor::new(2)));
        let summary = summarize(&reducer, 4, &CrawlResult::default()).unwrap();
        assert_eq!(summary.downloaded, 0);
        assert_eq!(summary.distinct_hosts, 0);
        assert_eq!(summary.deepest_page, None);
    }

    #[test]
    fn test_text_report() {
        let mut out = Vec::new();
        write_results(&mut out, &sample(), None, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Downloaded successfully (3):"));
        assert!(text.contains("\thttps://b.org/x"));
        assert!(text.contains("\thttps://c.org/: HTTP 500"));
        assert!(!text.contains("Summary:"));
    }

    #[test]
    fn test_json_report() {
        let reducer = Reducer::new(Arc::new(ParallelExecutor::new(1)));
        let result = sample();
        let summary = summarize(&reducer, 1, &result).unwrap();

        let mut out = Vec::new();
        write_results(&mut out, &result, Some(&summary), true).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["downloaded"].as_array().unwrap().len(), 3);
        assert_eq!(json["errors"]["https://c.org/"]["kind"], "status");
        assert_eq!(json["summary"]["https_pages"], 2);
    }
}
