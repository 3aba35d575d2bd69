/// Crawl target state definitions
///
/// Every URL handled in a crawl pass moves through
/// `Pending -> Fetching -> {Parsed | FetchFailed} -> Expanded -> Done`.
use std::fmt;

/// Represents the current state of a crawl target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    // ===== Active States =====
    /// Target is queued in the frontier, waiting for a worker
    Pending,

    /// Target is being fetched and parsed
    Fetching,

    /// Page was fetched and its links extracted (or taken from the cache)
    Parsed,

    /// Links have been pushed to the frontier (or the depth bound was reached)
    Expanded,

    // ===== Terminal States =====
    /// Target is fully processed
    Done,

    /// Fetch failed; the branch is abandoned but the session continues
    FetchFailed,
}

impl TargetState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::FetchFailed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// `Done -> Parsed` is allowed: a target reached again at a shallower depth
    /// is re-expanded from its cached links.
    pub fn can_transition_to(&self, next: TargetState) -> bool {
        use TargetState::*;

        matches!(
            (self, next),
            (Pending, Fetching)
                | (Pending, Parsed)
                | (Fetching, Parsed)
                | (Fetching, FetchFailed)
                | (Parsed, Expanded)
                | (Expanded, Done)
                | (Done, Parsed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Parsed => "parsed",
            Self::Expanded => "expanded",
            Self::Done => "done",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
