//! Crawl session state
//!
//! A session owns the visited cache, the root URL and everything accumulated
//! while crawling: discovered links, per-URL failures and counters. It lives
//! for one invocation and is never persisted.

use crate::crawler::cache::VisitedCache;
use crate::output::CrawlReport;
use crate::url::normalize_url;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use url::Url;

/// A per-URL failure captured during a crawl
#[derive(Debug)]
pub struct CrawlFailure {
    /// Cache key (normalized URL) the failure is attributed to
    pub url: String,

    /// Depth the URL was reached at
    pub depth: u32,

    pub error: CrawlError,
}

#[derive(Debug)]
pub struct CrawlSession {
    root: Url,
    cache: VisitedCache,

    /// Discovered links as `<base><link>`, in discovery order
    results: Vec<String>,

    failures: Vec<CrawlFailure>,
    pages_fetched: u64,
    cache_hits: u64,

    /// Deepest level any page was processed at
    deepest: u32,

    cancelled: bool,
    started_at: DateTime<Utc>,
}

impl CrawlSession {
    /// Creates a session rooted at the seed URL
    ///
    /// # Errors
    ///
    /// * `CrawlError::InvalidInput` - the seed is empty
    /// * `CrawlError::Url` - the seed is not an http(s) URL
    pub fn new(seed: &str) -> Result<Self, CrawlError> {
        if seed.trim().is_empty() {
            return Err(CrawlError::InvalidInput("url cannot be empty".to_string()));
        }

        let root = normalize_url(seed)?;

        Ok(Self {
            root,
            cache: VisitedCache::new(),
            results: Vec::new(),
            failures: Vec::new(),
            pages_fetched: 0,
            cache_hits: 0,
            deepest: 0,
            cancelled: false,
            started_at: Utc::now(),
        })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn cache(&self) -> &VisitedCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut VisitedCache {
        &mut self.cache
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn failures(&self) -> &[CrawlFailure] {
        &self.failures
    }

    /// Number of pages fetched over the network
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Number of pages served from the visited cache
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    pub fn deepest(&self) -> u32 {
        self.deepest
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns true if a failure has been recorded for the URL
    pub fn has_failed(&self, url: &str) -> bool {
        self.failures.iter().any(|f| f.url == url)
    }

    pub(crate) fn record_fetch(&mut self, depth: u32) {
        self.pages_fetched += 1;
        self.observe_depth(depth);
    }

    pub(crate) fn record_cache_hit(&mut self, depth: u32) {
        self.cache_hits += 1;
        self.observe_depth(depth);
    }

    pub(crate) fn record_results(&mut self, lines: Vec<String>) {
        self.results.extend(lines);
    }

    pub(crate) fn record_failure(&mut self, key: &str, depth: u32, error: CrawlError) {
        tracing::warn!("{} (depth {}): {}", key, depth, error);
        self.failures.push(CrawlFailure {
            url: key.to_string(),
            depth,
            error,
        });
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    fn observe_depth(&mut self, depth: u32) {
        self.deepest = self.deepest.max(depth);
    }

    /// Summarises the session for the end-of-crawl report
    pub fn report(&self, max_depth: u32) -> CrawlReport {
        CrawlReport::from_session(self, max_depth)
    }
}
