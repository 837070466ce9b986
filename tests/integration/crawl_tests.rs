//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use image_crawler::config::Config;
use image_crawler::crawler::{Coordinator, CrawlReport};
use image_crawler::state::{PageState, SkipReason};
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal PNG (signature + IHDR) zero-padded to `total_len` bytes
fn png_bytes(width: u32, height: u32, total_len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0, 0, 0, 0, 0]);
    bytes.resize(total_len.max(bytes.len()), 0);
    bytes
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

fn image(bytes: Vec<u8>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(bytes, "image/png")
}

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.start_url = Some(server.uri());
    config.crawler.delay_seconds = 0.01;
    config.crawler.request_timeout_secs = 5;
    config.crawler.head_timeout_secs = 5;
    config.output.directory = dir.path().join("images");
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

async fn crawl(config: Config) -> CrawlReport {
    Coordinator::new(config)
        .expect("coordinator setup")
        .run()
        .await
        .expect("crawl run")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn output_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path().join("images"))
        .expect("output directory exists")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_size_filter_scenario() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<img src="/a.png"><img src="/b.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(image(png_bytes(200, 200, 50 * 1024)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.png"))
        .respond_with(image(png_bytes(200, 200, 2 * 1024)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_pages = 1;
    config.crawler.max_depth = 0;
    config.filter.min_size_kb = 10;

    let report = crawl(config).await;

    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.images_accepted(), 1);
    assert_eq!(report.skips.count(SkipReason::TooSmallSize), 1);
    assert_eq!(report.images_failed(), 0);
    assert_eq!(output_files(&dir), vec!["a.png"]);
}

#[tokio::test]
async fn test_existing_file_is_not_downloaded_again() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<img src="/a.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(image(png_bytes(200, 200, 50 * 1024)))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("images")).unwrap();
    std::fs::write(dir.path().join("images/a.png"), b"previous run").unwrap();

    let mut config = create_test_config(&server, &dir);
    config.crawler.max_depth = 0;

    let report = crawl(config).await;

    assert_eq!(report.skips.count(SkipReason::AlreadyExists), 1);
    assert_eq!(report.images_failed(), 0);
    assert_eq!(
        std::fs::read(dir.path().join("images/a.png")).unwrap(),
        b"previous run"
    );
}

#[tokio::test]
async fn test_robots_disallowed_page_is_never_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/page">Secret</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_page(&server, "/public", "public").await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.pages_disallowed(), 1);
    let disallowed: Vec<_> = report
        .page_log
        .iter()
        .filter(|r| r.state == PageState::Disallowed)
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(disallowed, vec!["/private/page"]);
}

#[tokio::test]
async fn test_robots_fetch_failure_allows_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/private/page">Secret</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html("secret"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.pages_disallowed(), 0);
}

#[tokio::test]
async fn test_depth_bound() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/d1">1</a>"#).await;
    mount_page(&server, "/d1", r#"<a href="/d2">2</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/d2"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_depth = 1;

    let report = crawl(config).await;

    assert_eq!(report.pages_visited, 2);
    assert!(report.page_log.iter().all(|r| r.depth <= 1));
}

#[tokio::test]
async fn test_page_limit_and_visit_once() {
    let server = MockServer::start().await;
    let links: String = (1..=6)
        .map(|i| format!(r#"<a href="/p{i}">p{i}</a><a href="/p{i}/">again</a>"#))
        .collect();
    mount_page(&server, "/", &links).await;
    for i in 1..=6 {
        mount_page(&server, &format!("/p{}", i), r#"<a href="/">home</a><a href="/p1">p1</a>"#)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_pages = 3;

    let report = crawl(config).await;

    assert_eq!(report.pages_visited, 3);
    let urls: HashSet<_> = report.page_log.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls.len(), report.page_log.len());
}

#[tokio::test]
async fn test_failed_page_is_not_requeued() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/broken">b</a><a href="/next">n</a>"#).await;
    mount_page(&server, "/next", r#"<a href="/broken">b again</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.pages_failed(), 1);
}

#[tokio::test]
async fn test_cross_domain_links_are_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("elsewhere"))
        .expect(0)
        .mount(&other)
        .await;
    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}/page">Other site</a>"#, other.uri()),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_visited, 1);
}

#[tokio::test]
async fn test_duplicate_suppression() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<img src="/x.png"><img src="/y.png">"#).await;
    for p in ["/x.png", "/y.png"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(image(png_bytes(300, 300, 20 * 1024)))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.filter.no_duplicates = true;

    let report = crawl(config).await;

    assert_eq!(report.images_accepted(), 1);
    assert_eq!(report.skips.count(SkipReason::Duplicate), 1);
    assert_eq!(output_files(&dir).len(), 1);
}

#[tokio::test]
async fn test_duplicates_allowed_by_default() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<img src="/x.png"><img src="/y.png">"#).await;
    for p in ["/x.png", "/y.png"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(image(png_bytes(300, 300, 20 * 1024)))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.images_accepted(), 2);
    assert_eq!(output_files(&dir), vec!["x.png", "y.png"]);
}

#[tokio::test]
async fn test_first_failing_filter_wins() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<img src="/tiny.png"><img src="/narrow.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/tiny.png"))
        .respond_with(image(png_bytes(10, 10, 1024)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/narrow.png"))
        .respond_with(image(png_bytes(10, 500, 20 * 1024)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.skips.count(SkipReason::TooSmallSize), 1);
    assert_eq!(report.skips.count(SkipReason::TooSmallDimensions), 1);
    assert_eq!(report.images_accepted(), 0);
}

#[tokio::test]
async fn test_no_partial_files_left_behind() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/small.png"><img src="/gone.png"><img src="/ok.png">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/small.png"))
        .respond_with(image(png_bytes(200, 200, 512)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok.png"))
        .respond_with(image(png_bytes(200, 200, 20 * 1024)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.images_accepted(), 1);
    assert_eq!(report.images_failed(), 1);
    assert_eq!(report.skips.count(SkipReason::TooSmallSize), 1);
    assert_eq!(output_files(&dir), vec!["ok.png"]);
}

#[tokio::test]
async fn test_excluded_format_is_skipped_without_request() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/photo.webp"><div style="background: url('/bg.webp')"></div>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/photo.webp"))
        .respond_with(image(png_bytes(200, 200, 20 * 1024)))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.images_found, 0);
    assert_eq!(report.images_accepted(), 0);
}

#[tokio::test]
async fn test_image_shared_between_pages_is_fetched_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<img src="/logo.png"><a href="/about">About</a>"#).await;
    mount_page(&server, "/about", r#"<img src="/logo.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(image(png_bytes(200, 200, 20 * 1024)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.images_accepted(), 1);
    assert_eq!(report.images_skipped(), 0);
}

#[tokio::test]
async fn test_parallel_image_workers() {
    let server = MockServer::start().await;
    let imgs: String = (0..6).map(|i| format!(r#"<img src="/img{i}.png">"#)).collect();
    mount_page(&server, "/", &imgs).await;
    for i in 0..6 {
        Mock::given(method("GET"))
            .and(path(format!("/img{}.png", i)))
            .respond_with(image(png_bytes(200, 200 + i, 20 * 1024)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.image_workers = 3;
    config.filter.no_duplicates = true;

    let report = crawl(config).await;

    assert_eq!(report.images_accepted(), 6);
    assert_eq!(output_files(&dir).len(), 6);
}

#[tokio::test]
async fn test_image_sources_from_picture_and_css() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"
        <style>.hero { background-image: url("/hero.jpg"); }</style>
        <picture><source srcset="/wide.png 1200w, /narrow.png 600w"></picture>
        "#,
    )
    .await;
    for p in ["/hero.jpg", "/wide.png", "/narrow.png"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(image(png_bytes(400, 400, 20 * 1024)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.images_accepted(), 3);
    assert_eq!(output_files(&dir), vec!["hero.jpg", "narrow.png", "wide.png"]);
}

#[tokio::test]
async fn test_timeouts_fail_the_target_and_the_crawl_moves_on() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/slow.png"><a href="/slow">slow</a><a href="/next">next</a>"#,
    )
    .await;
    mount_page(&server, "/next", "next").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late").set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow.png"))
        .respond_with(image(png_bytes(200, 200, 20 * 1024)).set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.request_timeout_secs = 1;

    let report = crawl(config).await;

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.pages_failed(), 1);
    assert_eq!(report.images_failed(), 1);
    let failed: Vec<_> = report
        .page_log
        .iter()
        .filter(|r| r.state == PageState::FetchFailed)
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(failed, vec!["/slow"]);
    assert!(output_files(&dir).is_empty());
}

#[tokio::test]
async fn test_directory_link_matches_directory_rule() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"))
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/private/">Secret area</a>"#).await;
    for p in ["/private", "/private/"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(html("secret"))
            .expect(0)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.pages_disallowed(), 1);
}

#[tokio::test]
async fn test_redirect_into_disallowed_path_is_not_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"))
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/moved">Moved</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/private/page"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/private/page", r#"<img src="/private/photo.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/private/photo.png"))
        .respond_with(image(png_bytes(200, 200, 20 * 1024)))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_visited, 1);
    let disallowed: Vec<_> = report
        .page_log
        .iter()
        .filter(|r| r.state == PageState::Disallowed)
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(disallowed, vec!["/moved"]);
}
