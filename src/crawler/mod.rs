//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - HTML parsing and link extraction
//! - The visited cache and the depth-aware frontier
//! - Overall crawl coordination, sequential or with a worker pool

mod cache;
mod coordinator;
mod fetcher;
mod parser;
mod scheduler;
mod session;

pub use cache::VisitedCache;
pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, Fetcher, HttpFetcher};
pub use parser::{HtmlLinkExtractor, LinkExtractor};
pub use scheduler::{CrawlTarget, Frontier};
pub use session::{CrawlFailure, CrawlSession};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::CrawlError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl from the configured seed
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and coordinator
/// 2. Create a fresh session rooted at the seed
/// 3. Crawl from depth 0, concurrently unless `sequential` is set
/// 4. Summarise the session
///
/// Cancelling `cancel` stops the crawl early; the returned report is then
/// marked as cancelled.
pub async fn run_crawl(
    config: &Config,
    sequential: bool,
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlError> {
    let coordinator = Coordinator::from_config(config)?.with_cancellation(cancel);
    let mut session = CrawlSession::new(&config.crawler.seed_url)?;
    let seed = config.crawler.seed_url.as_str();

    tracing::info!(
        "Starting crawl of {} (max depth {}, {} workers)",
        seed,
        coordinator.max_depth(),
        if sequential { 1 } else { coordinator.workers() }
    );

    if sequential {
        coordinator.crawl(&mut session, seed, 0).await?;
    } else {
        coordinator.crawl_concurrent(&mut session, seed, 0).await?;
    }

    Ok(session.report(coordinator.max_depth()))
}
