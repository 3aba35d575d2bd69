//! Output module for reporting crawl results
//!
//! This module handles:
//! - Emitting discovered links as `<base><link>` lines
//! - Summarising a finished session into a report

pub mod stats;

pub use stats::{print_report, CrawlReport};

/// Formats each link as `<base><link>` and logs it
///
/// `base` is the scheme and authority of the page the links were found on,
/// without a trailing slash.
pub fn link_lines(base: &str, links: &[String]) -> Vec<String> {
    links
        .iter()
        .map(|link| {
            let line = format!("{}{}", base, link);
            tracing::info!("{}", line);
            line
        })
        .collect()
}
