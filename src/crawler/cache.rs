//! Visited cache: the single source of truth for "already processed"
//!
//! Maps a normalized URL to the ordered links extracted from its page. A key
//! is written at most once per session; later writes are ignored.

use crate::url::normalize_url;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct VisitedCache {
    entries: HashMap<String, Vec<String>>,
}

impl VisitedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a URL; falls back to the raw string if it cannot be normalized
    fn key(url: &str) -> String {
        normalize_url(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string())
    }

    /// Returns true if links for this URL have already been recorded
    pub fn has(&self, url: &str) -> bool {
        self.entries.contains_key(&Self::key(url))
    }

    /// Returns the cached links for a URL
    pub fn get(&self, url: &str) -> Option<&[String]> {
        self.entries.get(&Self::key(url)).map(Vec::as_slice)
    }

    /// Records the links extracted from a URL
    ///
    /// First write wins: returns `false` and leaves the existing entry
    /// untouched if the URL is already present.
    pub fn put(&mut self, url: &str, links: Vec<String>) -> bool {
        let key = Self::key(url);
        if self.entries.contains_key(&key) {
            tracing::debug!("Ignoring second write for {}", key);
            return false;
        }
        self.entries.insert(key, links);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the cached (normalized) URLs in no particular order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total number of links across all cached pages
    pub fn link_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
