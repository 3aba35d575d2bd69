//! Ripple-Walk: a depth-bounded link crawler
//!
//! Starting from a seed URL, this crate fetches a page, extracts the site-relative
//! links on it and follows them up to a configured depth, never fetching the same
//! URL twice within a crawl session.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid depth {0}: depth cannot be less than 0")]
    InvalidDepth(i64),

    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Link extraction failed for {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("Target {0} is not in the frontier")]
    UnknownTarget(String),

    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: state::TargetState,
        to: state::TargetState,
    },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors produced by a [`crawler::Fetcher`]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("url cannot be empty")]
    InvalidInput,

    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("endpoint is unhealthy: {url} returned HTTP {status_code}")]
    UnhealthyEndpoint { url: String, status_code: u16 },
}

/// Errors produced by a [`crawler::LinkExtractor`]
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid selector: {0}")]
    Selector(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlSession, Fetcher, HttpFetcher, LinkExtractor, VisitedCache};
pub use output::CrawlReport;
pub use state::TargetState;
pub use crate::url::{normalize_url, resolve_link};
