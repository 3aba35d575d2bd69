//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the per-session HTTP client with timeouts and user agent
//! - GET requests for page content
//! - Error classification (transport, timeout, unhealthy endpoint)

use crate::config::{HttpConfig, UserAgentConfig};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Capability to retrieve the body of a page
///
/// Implementations must fail with [`FetchError::InvalidInput`] for an empty URL
/// without touching the network, and with [`FetchError::UnhealthyEndpoint`]
/// for any non-2xx response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use ripple_walk::config::{HttpConfig, UserAgentConfig};
/// use ripple_walk::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    http: &HttpConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.request_timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .redirect(Policy::limited(http.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with a fresh client scoped to one crawl session
    pub fn from_config(http: &HttpConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(http, user_agent)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidInput);
        }

        tracing::info!("Visiting {:?}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            // Dropping the response releases the connection and any unread body
            drop(response);
            return Err(FetchError::UnhealthyEndpoint {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a `reqwest` error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            reason: format!("connection failed: {}", error),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}
