//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use ripple_walk::config::{parse_config, Config, CrawlerConfig};
use ripple_walk::crawler::{run_crawl, Coordinator, CrawlSession, Fetcher, HttpFetcher};
use ripple_walk::{CrawlError, FetchError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given seed
fn create_test_config(seed_url: &str, max_depth: u32, workers: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: seed_url.to_string(),
            max_depth,
            workers,
        },
        ..Config::default()
    }
}

fn html_page(links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();

    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>Test</title></head><body>{}</body></html>",
            anchors
        ))
        .insert_header("content-type", "text/html")
}

/// Mounts a small site:
///
/// ```text
/// /         -> /a, /b, https://other.com/x
/// /a        -> /c, /missing
/// /b        -> /a, /
/// /c        -> /d
/// /d        -> (none)
/// /missing  -> 404
/// ```
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&["/a", "/b", "https://other.com/x"]))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page(&["/c", "/missing"]))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page(&["/a", "/"]))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html_page(&["/d"]))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(html_page(&[]))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

fn sorted_keys(session: &CrawlSession) -> Vec<String> {
    let mut keys: Vec<String> = session.cache().urls().map(str::to_string).collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_http_fetcher_returns_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .mount(&mock_server)
        .await;

    let config = Config::default();
    let fetcher = HttpFetcher::from_config(&config.http, &config.user_agent).unwrap();
    let body = fetcher
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(body, "<html>hello</html>");
}

#[tokio::test]
async fn test_http_fetcher_non_success_is_unhealthy() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = Config::default();
    let fetcher = HttpFetcher::from_config(&config.http, &config.user_agent).unwrap();
    let result = fetcher.fetch(&format!("{}/gone", mock_server.uri())).await;

    assert!(matches!(
        result,
        Err(FetchError::UnhealthyEndpoint {
            status_code: 500,
            ..
        })
    ));
}

#[tokio::test]
async fn test_http_fetcher_empty_url() {
    let config = Config::default();
    let fetcher = HttpFetcher::from_config(&config.http, &config.user_agent).unwrap();

    assert!(matches!(
        fetcher.fetch("").await,
        Err(FetchError::InvalidInput)
    ));
}

#[tokio::test]
async fn test_full_crawl_respects_depth() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base = mock_server.uri();

    let config = create_test_config(&base, 2, 1);
    let coordinator = Coordinator::from_config(&config).unwrap();
    let mut session = CrawlSession::new(&base).unwrap();

    coordinator.crawl(&mut session, &base, 0).await.unwrap();

    // /d sits at depth 3 and is never reached
    assert_eq!(
        sorted_keys(&session),
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/c", base),
        ]
    );
    assert!(session.has_failed(&format!("{}/missing", base)));
    assert_eq!(session.deepest(), 2);

    // Links are reported against the page's origin; absolute links are dropped
    assert!(session.results().contains(&format!("{}/a", base)));
    assert!(!session
        .results()
        .iter()
        .any(|line| line.contains("other.com")));
}

#[tokio::test]
async fn test_second_crawl_does_not_refetch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&["/leaf"]))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leaf"))
        .respond_with(html_page(&["/"]))
        .expect(1)
        .mount(&mock_server)
        .await;
    let base = mock_server.uri();

    let config = create_test_config(&base, 3, 2);
    let coordinator = Coordinator::from_config(&config).unwrap();
    let mut session = CrawlSession::new(&base).unwrap();

    coordinator
        .crawl_concurrent(&mut session, &base, 0)
        .await
        .unwrap();
    coordinator
        .crawl_concurrent(&mut session, &base, 0)
        .await
        .unwrap();

    assert_eq!(session.pages_fetched(), 2);
    assert_eq!(session.cache().len(), 2);
    // Expectations are verified when the server is dropped
}

#[tokio::test]
async fn test_concurrent_crawl_matches_sequential() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base = mock_server.uri();

    for max_depth in 0..5 {
        let config = create_test_config(&base, max_depth, 4);
        let coordinator = Coordinator::from_config(&config).unwrap();

        let mut sequential = CrawlSession::new(&base).unwrap();
        coordinator.crawl(&mut sequential, &base, 0).await.unwrap();

        let mut concurrent = CrawlSession::new(&base).unwrap();
        coordinator
            .crawl_concurrent(&mut concurrent, &base, 0)
            .await
            .unwrap();

        assert_eq!(sorted_keys(&sequential), sorted_keys(&concurrent));
    }
}

#[tokio::test]
async fn test_crawl_rejects_invalid_input() {
    let config = create_test_config("https://example.com", 2, 1);
    let coordinator = Coordinator::from_config(&config).unwrap();
    let mut session = CrawlSession::new("https://example.com").unwrap();

    assert!(matches!(
        coordinator.crawl(&mut session, "", 0).await,
        Err(CrawlError::InvalidInput(_))
    ));
    assert!(matches!(
        coordinator
            .crawl(&mut session, "https://example.com", -1)
            .await,
        Err(CrawlError::InvalidDepth(-1))
    ));
    assert!(session.cache().is_empty());
}

#[tokio::test]
async fn test_run_crawl_reports_seed_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2, 2);
    let report = run_crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.pages_visited, 0);
    assert_eq!(report.failures.len(), 1);
}

#[tokio::test]
async fn test_run_crawl_from_toml_config() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let toml = format!(
        r#"
        [crawler]
        seed-url = "{}"
        max-depth = 1
        workers = 2
        "#,
        mock_server.uri()
    );
    let config = parse_config(&toml).unwrap();

    let report = run_crawl(&config, false, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.deepest, 1);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_link_with_trailing_slash_is_fetched_as_written() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&["/docs/"]))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html_page(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&mock_server)
        .await;
    let base = mock_server.uri();

    let config = create_test_config(&base, 2, 2);
    let coordinator = Coordinator::from_config(&config).unwrap();
    let mut session = CrawlSession::new(&base).unwrap();

    coordinator
        .crawl_concurrent(&mut session, &base, 0)
        .await
        .unwrap();

    assert!(session.failures().is_empty());
    assert!(session.cache().has(&format!("{}/docs", base)));
}

#[tokio::test]
async fn test_cancel_stops_crawl_with_fetch_in_flight() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&["/slow"]))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page(&[]).set_delay(Duration::from_secs(20)))
        .mount(&mock_server)
        .await;
    let base = mock_server.uri();

    for sequential in [true, false] {
        let config = create_test_config(&base, 2, 2);
        let cancel = CancellationToken::new();
        let coordinator = Coordinator::from_config(&config)
            .unwrap()
            .with_cancellation(cancel.clone());
        let mut session = CrawlSession::new(&base).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            cancel.cancel();
        });

        let started = Instant::now();
        if sequential {
            coordinator.crawl(&mut session, &base, 0).await.unwrap();
        } else {
            coordinator
                .crawl_concurrent(&mut session, &base, 0)
                .await
                .unwrap();
        }

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(session.is_cancelled());
        assert!(session.cache().has(&format!("{}/", base)));
        assert!(!session.cache().has(&format!("{}/slow", base)));

        let report = session.report(coordinator.max_depth());
        assert!(report.cancelled);
        assert!(report.is_success());
    }
}
