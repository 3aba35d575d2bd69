//! URL handling module for Ripple-Walk
//!
//! Cache-key normalization and resolution of site-relative links against the
//! page they were found on. Resolved URLs are fetched as-is; only their
//! normalized form is used as a key.

mod normalize;

use crate::UrlError;
use url::Url;

pub use normalize::normalize_url;

/// Returns true if `href` is a site-relative link (`/path`)
///
/// Protocol-relative references (`//host/path`) start with a slash too but
/// point at another host, so they are rejected.
///
/// # Examples
///
/// ```
/// use ripple_walk::url::is_site_relative;
///
/// assert!(is_site_relative("/i/business"));
/// assert!(!is_site_relative("//cdn.example.com/x.js"));
/// assert!(!is_site_relative("https://example.com/"));
/// assert!(!is_site_relative("#top"));
/// ```
pub fn is_site_relative(href: &str) -> bool {
    href.starts_with('/') && !href.starts_with("//")
}

/// Parses a URL to fetch: http(s) with a host, fragment removed
///
/// Unlike [`normalize_url`] the path and query are left untouched.
pub fn parse_http_url(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves a site-relative link against the page it was found on
///
/// The result is the URL to fetch: only the fragment is dropped. Use
/// [`normalize_url`] on it to get the visited-cache key.
///
/// # Examples
///
/// ```
/// use ripple_walk::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://monzo.com/i/").unwrap();
/// let url = resolve_link(&base, "/i/business/#top").unwrap();
/// assert_eq!(url.as_str(), "https://monzo.com/i/business/");
/// ```
pub fn resolve_link(base: &Url, link: &str) -> Result<Url, UrlError> {
    if !is_site_relative(link) {
        return Err(UrlError::Parse(format!(
            "'{}' is not a site-relative link",
            link
        )));
    }

    let joined = base
        .join(link)
        .map_err(|e| UrlError::Parse(format!("Failed to resolve '{}': {}", link, e)))?;

    parse_http_url(joined.as_str())
}

/// Returns the `scheme://host[:port]` prefix of a URL, used as the `<base>`
/// in discovered-link log lines
pub fn origin_prefix(url: &Url) -> String {
    url.origin().ascii_serialization()
}
