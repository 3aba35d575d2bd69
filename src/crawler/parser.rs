//! HTML link extraction
//!
//! Collects the `href` of every anchor in document order and keeps only the
//! site-relative ones (`/path`). Absolute, protocol-relative, fragment and
//! query-only references are dropped without error.

use crate::url::is_site_relative;
use crate::ParseError;
use scraper::{Html, Selector};
use url::Url;

/// Capability to pull links out of a fetched document
pub trait LinkExtractor: Send + Sync {
    /// Returns the site-relative links found in `body`, in document order
    ///
    /// Duplicates are kept; an empty vector means no anchors were found.
    fn extract(&self, body: &str, base_url: &Url) -> Result<Vec<String>, ParseError>;
}

/// [`LinkExtractor`] built on the `scraper` HTML5 parser
///
/// The parser recovers from malformed markup, so broken documents yield
/// whatever anchors could be recovered rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &str, base_url: &Url) -> Result<Vec<String>, ParseError> {
        let selector =
            Selector::parse("a[href]").map_err(|e| ParseError::Selector(format!("{:?}", e)))?;

        let document = Html::parse_document(body);

        let links: Vec<String> = document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| is_site_relative(href))
            .map(str::to_string)
            .collect();

        tracing::trace!("Extracted {} links from {}", links.len(), base_url);

        Ok(links)
    }
}
