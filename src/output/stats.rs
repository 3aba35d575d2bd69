//! Statistics for a finished crawl session
//!
//! This module provides functionality for summarising a session and
//! displaying the summary at the end of a run.

use crate::crawler::CrawlSession;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Crawl report summary
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Normalized seed URL
    pub seed: String,

    pub max_depth: u32,

    /// Number of distinct pages in the visited cache
    pub pages_visited: usize,

    /// Pages fetched over the network
    pub pages_fetched: u64,

    /// Pages served from the visited cache
    pub cache_hits: u64,

    /// Total number of links discovered
    pub links_found: usize,

    /// Deepest level any page was processed at
    pub deepest: u32,

    /// Failed URLs and their error messages, in order of occurrence
    pub failures: Vec<(String, String)>,

    /// Failures where the page could not be fetched at all
    pub fetch_failures: usize,

    /// Failure counts grouped by kind
    pub failure_summary: BTreeMap<&'static str, usize>,

    /// True if the seed itself could not be fetched
    pub seed_failed: bool,

    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Summarises a session
    pub fn from_session(session: &CrawlSession, max_depth: u32) -> Self {
        let seed = session.root().to_string();

        let mut failure_summary = BTreeMap::new();
        for failure in session.failures() {
            *failure_summary.entry(failure_kind(&failure.error)).or_insert(0) += 1;
        }

        Self {
            seed_failed: session.has_failed(&seed) && !session.cache().has(&seed),
            seed,
            max_depth,
            pages_visited: session.cache().len(),
            pages_fetched: session.pages_fetched(),
            cache_hits: session.cache_hits(),
            links_found: session.cache().link_count(),
            deepest: session.deepest(),
            failures: session
                .failures()
                .iter()
                .map(|f| (f.url.clone(), f.error.to_string()))
                .collect(),
            fetch_failures: session
                .failures()
                .iter()
                .filter(|f| matches!(f.error, CrawlError::Fetch { .. }))
                .count(),
            failure_summary,
            cancelled: session.is_cancelled(),
            started_at: session.started_at(),
            finished_at: Utc::now(),
        }
    }

    /// A crawl succeeds when the seed was reached, whatever happened below it
    pub fn is_success(&self) -> bool {
        !self.seed_failed
    }

    /// Share of fetch attempts that returned a page, in percent
    ///
    /// A page that was fetched but could not be parsed still counts as a
    /// successful fetch.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_fetched + self.fetch_failures as u64;
        if attempted > 0 {
            (self.pages_fetched as f64 / attempted as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

fn failure_kind(error: &CrawlError) -> &'static str {
    use crate::FetchError;

    match error {
        CrawlError::Fetch { source, .. } => match source {
            FetchError::InvalidInput => "invalid input",
            FetchError::Transport { .. } => "transport",
            FetchError::Timeout { .. } => "timeout",
            FetchError::UnhealthyEndpoint { .. } => "unhealthy endpoint",
        },
        CrawlError::Parse { .. } => "parse",
        _ => "other",
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Seed: {}", report.seed);
    println!("  Max depth: {}", report.max_depth);
    println!("  Deepest level reached: {}", report.deepest);
    println!("  Pages visited: {}", report.pages_visited);
    println!("  Pages fetched: {}", report.pages_fetched);
    println!("  Cache hits: {}", report.cache_hits);
    println!("  Links found: {}", report.links_found);
    println!(
        "  Duration: {:.2}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    if !report.failure_summary.is_empty() {
        println!("Failure Summary:");
        let mut counts: Vec<_> = report.failure_summary.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();

        println!("Failed URLs ({}):", report.failures.len());
        for (url, error) in &report.failures {
            println!("  - {}: {}", url, error);
        }
        println!();
    }

    if report.cancelled {
        println!("Crawl was cancelled before the frontier was exhausted.");
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        report.success_rate(),
        report.pages_fetched,
        report.pages_fetched + report.fetch_failures as u64
    );
}
