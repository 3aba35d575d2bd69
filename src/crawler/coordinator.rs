//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the traversal that ties everything together:
//! - Validating the starting URL and depth
//! - Driving the frontier work-list
//! - Consulting the visited cache before any fetch
//! - Fetching, extracting links and storing them in the cache
//! - Collecting per-URL failures without aborting sibling branches
//! - Observing cancellation

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::scheduler::{CrawlTarget, Frontier};
use crate::crawler::session::CrawlSession;
use crate::output::link_lines;
use crate::state::TargetState;
use crate::url::{origin_prefix, parse_http_url};
use crate::{CrawlError, FetchError, ParseError};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a worker brings back for one target
#[derive(Debug)]
enum PageOutcome {
    Links(Vec<String>),
    Unparseable(ParseError),
    Failed(FetchError),
}

/// Fetches a page and extracts its links
async fn fetch_and_extract(
    fetcher: &dyn Fetcher,
    extractor: &dyn LinkExtractor,
    url: &Url,
) -> PageOutcome {
    let body = match fetcher.fetch(url.as_str()).await {
        Ok(body) => body,
        Err(e) => return PageOutcome::Failed(e),
    };

    match extractor.extract(&body, url) {
        Ok(links) => PageOutcome::Links(links),
        Err(e) => PageOutcome::Unparseable(e),
    }
}

/// Runs [`fetch_and_extract`] for one target, turning a panic into a failure
///
/// A panicking fetcher or extractor is attributed to the URL it was working
/// on instead of leaving the target in flight.
async fn process_page(
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    url: &Url,
) -> PageOutcome {
    let work = fetch_and_extract(fetcher.as_ref(), extractor.as_ref(), url);
    let result = AssertUnwindSafe(work).catch_unwind().await;

    match result {
        Ok(outcome) => outcome,
        Err(panic) => PageOutcome::Failed(FetchError::Transport {
            url: url.to_string(),
            reason: format!("worker panicked: {}", panic_message(panic.as_ref())),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Main crawler coordinator structure
///
/// The fetcher and extractor are injected so alternate transports or parsers
/// can be substituted. The coordinator is the single owner of the frontier
/// and, through the session, of the visited cache; workers only fetch and
/// parse.
pub struct Coordinator {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    max_depth: u32,
    workers: usize,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            max_depth: config.max_depth,
            workers: (config.workers as usize).max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Builds a coordinator with an HTTP fetcher and HTML extractor from config
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::from_config(&config.http, &config.user_agent)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(HtmlLinkExtractor::new()),
            &config.crawler,
        ))
    }

    /// Replaces the cancellation token, e.g. with one wired to Ctrl-C
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels every crawl run by this coordinator
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Crawls from `url`, one page at a time
    ///
    /// Pages already in the session's cache are expanded from their cached
    /// links without a fetch. Pages at `depth >= max_depth` are fetched and
    /// reported but not expanded. Per-URL failures are recorded in the
    /// session and never abort the crawl.
    ///
    /// # Errors
    ///
    /// * `CrawlError::InvalidInput` - `url` is empty
    /// * `CrawlError::InvalidDepth` - `depth < 0`
    /// * `CrawlError::Url` - `url` is not an http(s) URL
    pub async fn crawl(
        &self,
        session: &mut CrawlSession,
        url: &str,
        depth: i64,
    ) -> Result<(), CrawlError> {
        let start = self.start_target(url, depth)?;
        let mut frontier = Frontier::new(self.max_depth);
        frontier.push(start);

        while let Some(target) = frontier.pop() {
            if self.cancel.is_cancelled() {
                break;
            }

            if self.try_cached(session, &mut frontier, &target)? {
                continue;
            }

            frontier.mark_fetching(&target.key)?;

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => break,
                outcome = process_page(
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.extractor),
                    &target.url,
                ) => outcome,
            };

            self.complete(session, &mut frontier, &target, outcome)?;
        }

        self.finish_pass(session, &mut frontier);
        Ok(())
    }

    /// Crawls from `url` with a bounded pool of concurrent workers
    ///
    /// Same contract as [`Coordinator::crawl`]; at most `workers` fetches are
    /// in flight at once and never two for the same URL. The final cache
    /// contents match the sequential crawl for the same seed and depth bound.
    pub async fn crawl_concurrent(
        &self,
        session: &mut CrawlSession,
        url: &str,
        depth: i64,
    ) -> Result<(), CrawlError> {
        let start = self.start_target(url, depth)?;
        let mut frontier = Frontier::new(self.max_depth);
        frontier.push(start);

        let mut in_flight: JoinSet<(CrawlTarget, PageOutcome)> = JoinSet::new();

        loop {
            while in_flight.len() < self.workers && !self.cancel.is_cancelled() {
                let Some(target) = frontier.pop() else {
                    break;
                };

                if self.try_cached(session, &mut frontier, &target)? {
                    continue;
                }

                frontier.mark_fetching(&target.key)?;

                let fetcher = Arc::clone(&self.fetcher);
                let extractor = Arc::clone(&self.extractor);
                in_flight.spawn(async move {
                    let outcome = process_page(fetcher, extractor, &target.url).await;
                    (target, outcome)
                });
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    in_flight.abort_all();
                    break;
                }
                joined = in_flight.join_next() => match joined {
                    Some(Ok((target, outcome))) => {
                        self.complete(session, &mut frontier, &target, outcome)?
                    }
                    Some(Err(e)) => tracing::error!("Crawl worker did not complete: {}", e),
                    None => break,
                },
            }
        }

        self.finish_pass(session, &mut frontier);
        Ok(())
    }

    /// Validates the starting point of a crawl
    fn start_target(&self, url: &str, depth: i64) -> Result<CrawlTarget, CrawlError> {
        if url.trim().is_empty() {
            return Err(CrawlError::InvalidInput("url cannot be empty".to_string()));
        }

        if depth < 0 {
            return Err(CrawlError::InvalidDepth(depth));
        }

        let depth = u32::try_from(depth).map_err(|_| CrawlError::InvalidDepth(depth))?;
        let url = parse_http_url(url)?;

        Ok(CrawlTarget::new(url, depth)?)
    }

    /// Serves a target from the visited cache if possible
    ///
    /// Returns true if the target was handled without a fetch.
    fn try_cached(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        target: &CrawlTarget,
    ) -> Result<bool, CrawlError> {
        let links = match session.cache().get(&target.key) {
            Some(links) => links.to_vec(),
            None => return Ok(false),
        };

        tracing::debug!("{:?} is already in cache", target.key);
        session.record_cache_hit(target.depth);
        frontier.mark_parsed(&target.key)?;
        self.expand(session, frontier, target, &links, false)?;

        Ok(true)
    }

    /// Records the outcome of a fetch and expands the page on success
    fn complete(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        target: &CrawlTarget,
        outcome: PageOutcome,
    ) -> Result<(), CrawlError> {
        let key = &target.key;

        match outcome {
            PageOutcome::Links(links) => {
                session.record_fetch(target.depth);
                session.cache_mut().put(key, links.clone());
                frontier.mark_parsed(key)?;
                self.expand(session, frontier, target, &links, true)
            }

            PageOutcome::Unparseable(e) => {
                // Treated as a page without links
                session.record_fetch(target.depth);
                session.record_failure(
                    key,
                    target.depth,
                    CrawlError::Parse {
                        url: target.url.to_string(),
                        source: e,
                    },
                );
                session.cache_mut().put(key, Vec::new());
                frontier.mark_parsed(key)?;
                self.expand(session, frontier, target, &[], true)
            }

            PageOutcome::Failed(e) => {
                frontier.mark_failed(key)?;
                session.record_failure(
                    key,
                    target.depth,
                    CrawlError::Fetch {
                        url: target.url.to_string(),
                        source: e,
                    },
                );
                Ok(())
            }
        }
    }

    /// Reports a page's links and pushes its children to the frontier
    fn expand(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        target: &CrawlTarget,
        links: &[String],
        fresh: bool,
    ) -> Result<(), CrawlError> {
        let lines = link_lines(&origin_prefix(&target.url), links);
        if fresh {
            session.record_results(lines);
        }

        let children = frontier.expand(target, links)?;
        tracing::debug!("{} queued {} new targets", target.key, children.len());

        Ok(())
    }

    fn finish_pass(&self, session: &mut CrawlSession, frontier: &mut Frontier) {
        if self.cancel.is_cancelled() {
            let discarded = frontier.close();
            session.mark_cancelled();
            tracing::info!(
                "Crawl cancelled, discarded {} pending targets, {} left unfinished",
                discarded,
                frontier.count_unsettled()
            );
        }

        tracing::info!(
            "Crawl pass finished: {} pages done, {} failed, {} pages in cache",
            frontier.count_in_state(TargetState::Done),
            frontier.count_in_state(TargetState::FetchFailed),
            session.cache().len()
        );
    }
}
