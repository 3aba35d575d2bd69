//! Frontier for a single crawl pass
//!
//! This module handles:
//! - The FIFO work-list of crawl targets, each carrying its own depth
//! - The best (smallest) depth each URL has been reached at
//! - Per-target state transitions
//! - Expansion of a parsed page into child targets, bounded by the max depth
//!
//! A URL is accepted again only when it is reached at a strictly smaller depth
//! than before. A cached page is then re-expanded from its links without a new
//! fetch, so the set of URLs visited does not depend on the order targets are
//! processed in.

use crate::state::TargetState;
use crate::url::{normalize_url, resolve_link};
use crate::{CrawlError, UrlError};
use std::collections::{HashMap, VecDeque};
use url::Url;

/// One URL queued for processing at a known depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// URL as resolved from the page it was found on; this is what gets fetched
    pub url: Url,

    /// Normalized form of `url`, used for the visited cache and the frontier
    pub key: String,

    /// Hops from the seed (seed is 0)
    pub depth: u32,
}

impl CrawlTarget {
    /// Creates a target, deriving its key from `url`
    pub fn new(url: Url, depth: u32) -> Result<Self, UrlError> {
        let key = normalize_url(url.as_str())?.to_string();
        Ok(Self { url, key, depth })
    }
}

/// Frontier manages the work-list and target states of one crawl pass
///
/// All bookkeeping is keyed by [`CrawlTarget::key`].
#[derive(Debug)]
pub struct Frontier {
    /// Targets at depth >= max_depth are not expanded
    max_depth: u32,

    /// Targets waiting for a worker, in discovery order
    pending: VecDeque<CrawlTarget>,

    /// Smallest depth each key has been reached at
    best_depth: HashMap<String, u32>,

    /// Current state of every key seen in this pass
    states: HashMap<String, TargetState>,

    /// Set once the pass is cancelled; no further targets are accepted
    closed: bool,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            pending: VecDeque::new(),
            best_depth: HashMap::new(),
            states: HashMap::new(),
            closed: false,
        }
    }

    /// Offers a target to the frontier
    ///
    /// Returns true if the target was accepted: either the key is new to this
    /// pass, or it was reached at a strictly smaller depth than before. A key
    /// whose fetch is in flight only records the better depth; the pending
    /// fetch will be expanded with it. Failed keys are never retried.
    pub fn push(&mut self, target: CrawlTarget) -> bool {
        if self.closed {
            return false;
        }

        if let Some(&best) = self.best_depth.get(&target.key) {
            if target.depth >= best {
                return false;
            }
        }

        match self.states.get(&target.key) {
            Some(TargetState::FetchFailed) => return false,
            Some(TargetState::Fetching) => {
                self.best_depth.insert(target.key, target.depth);
                return true;
            }
            Some(_) => {}
            None => {
                self.states
                    .insert(target.key.clone(), TargetState::Pending);
            }
        }

        self.best_depth.insert(target.key.clone(), target.depth);
        self.pending.push_back(target);
        true
    }

    /// Pops the next target to process
    ///
    /// Entries superseded by a later push at a smaller depth are skipped.
    pub fn pop(&mut self) -> Option<CrawlTarget> {
        while let Some(target) = self.pending.pop_front() {
            let stale = self
                .best_depth
                .get(&target.key)
                .map_or(false, |best| target.depth > *best);

            if stale {
                tracing::trace!(
                    "Skipping superseded target {} at depth {}",
                    target.key,
                    target.depth
                );
                continue;
            }

            return Some(target);
        }

        None
    }

    /// Marks a target as being fetched
    pub fn mark_fetching(&mut self, key: &str) -> Result<(), CrawlError> {
        self.transition(key, TargetState::Fetching)
    }

    /// Marks a target's links as known (fetched, or taken from the cache)
    pub fn mark_parsed(&mut self, key: &str) -> Result<(), CrawlError> {
        self.transition(key, TargetState::Parsed)
    }

    /// Marks a target's fetch as failed; the branch is abandoned
    pub fn mark_failed(&mut self, key: &str) -> Result<(), CrawlError> {
        self.transition(key, TargetState::FetchFailed)
    }

    /// Expands a parsed target into child targets
    ///
    /// Links are resolved against the target's fetched URL. The expansion uses
    /// the best depth recorded for the key, which may be smaller than the
    /// depth it was dispatched at. Nothing is pushed once the depth bound is
    /// reached. Returns the children that were accepted.
    pub fn expand(
        &mut self,
        target: &CrawlTarget,
        links: &[String],
    ) -> Result<Vec<CrawlTarget>, CrawlError> {
        self.transition(&target.key, TargetState::Expanded)?;

        let depth = self.depth_of(&target.key).unwrap_or(target.depth);
        let mut accepted = Vec::new();

        if depth < self.max_depth {
            for link in links {
                let child = match resolve_link(&target.url, link)
                    .and_then(|url| CrawlTarget::new(url, depth + 1))
                {
                    Ok(child) => child,
                    Err(e) => {
                        tracing::debug!("Skipping link {} on {}: {}", link, target.url, e);
                        continue;
                    }
                };

                if self.push(child.clone()) {
                    accepted.push(child);
                }
            }
        }

        self.transition(&target.key, TargetState::Done)?;
        Ok(accepted)
    }

    /// Closes the frontier and discards every pending target
    ///
    /// Returns the number of targets discarded.
    pub fn close(&mut self) -> usize {
        self.closed = true;
        let discarded = self.pending.len();
        self.pending.clear();
        discarded
    }

    /// Smallest depth the key has been reached at in this pass
    pub fn depth_of(&self, key: &str) -> Option<u32> {
        self.best_depth.get(key).copied()
    }

    /// Number of keys currently in the given state
    pub fn count_in_state(&self, state: TargetState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    /// Number of keys that never reached a terminal state
    pub fn count_unsettled(&self) -> usize {
        self.states.values().filter(|s| !s.is_terminal()).count()
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    fn state_of(&self, key: &str) -> Option<TargetState> {
        self.states.get(key).copied()
    }

    fn transition(&mut self, key: &str, next: TargetState) -> Result<(), CrawlError> {
        let current = self
            .states
            .get_mut(key)
            .ok_or_else(|| CrawlError::UnknownTarget(key.to_string()))?;

        if !current.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                url: key.to_string(),
                from: *current,
                to: next,
            });
        }

        *current = next;
        Ok(())
    }
}
