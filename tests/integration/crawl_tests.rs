//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use site_harvest::config::{load_config, Config};
use site_harvest::crawler::{run_crawl, Coordinator};
use site_harvest::state::{PageState, RejectReason};
use site_harvest::storage::{get_json, MemoryObjectStore, ObjectStore, PageCapture};
use site_harvest::url::page_capture_key;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a config for a crawl of the mock server
fn create_test_config(seeds: &[String], max_depth: u32, extra: &str) -> Config {
    let seeds = seeds
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");

    toml::from_str(&format!(
        r#"
        [site]
        name = "Acme"

        [crawler]
        seeds = [{seeds}]
        allowed-domains = ["127.0.0.1"]
        max-depth = {max_depth}
        max-concurrent-requests = 4
        request-timeout-secs = 5
        {extra}

        [storage]
        object-store-path = "unused"
        document-store-path = "unused.db"
        "#
    ))
    .expect("test config should parse")
}

/// Mounts an HTML page that must be fetched exactly `times` times
async fn mount_page(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn crawl(config: Config) -> (Arc<MemoryObjectStore>, Coordinator) {
    let objects = Arc::new(MemoryObjectStore::new());
    let mut coordinator =
        Coordinator::new(config, objects.clone()).expect("coordinator should start");
    coordinator.run().await.expect("crawl should finish");
    (objects, coordinator)
}

fn captured_urls(objects: &MemoryObjectStore) -> Vec<String> {
    let keys = objects.list("pages/Acme/").unwrap().unwrap_or_default();
    let mut urls: Vec<String> = keys
        .iter()
        .map(|key| get_json::<PageCapture>(objects, key).unwrap().url)
        .collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_full_crawl_writes_captures_to_filesystem() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
           <a href="/page1">Page 1</a>
           <a href="/page2">Page 2</a>
           </body></html>"#,
        1,
    )
    .await;
    mount_page(&server, "/page1", "<p>One</p>", 1).await;
    mount_page(&server, "/page2", "<p>Two</p>", 1).await;

    let dir = TempDir::new().unwrap();
    let bucket = dir.path().join("bucket");
    let config_path = dir.path().join("harvest.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
            [site]
            name = "Acme"

            [crawler]
            seeds = ["{base}/"]
            allowed-domains = ["127.0.0.1"]
            request-timeout-secs = 5

            [storage]
            object-store-path = "{bucket}"
            document-store-path = "{db}"
            "#,
            bucket = bucket.display(),
            db = dir.path().join("docs.db").display()
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let stats = run_crawl(config).await.unwrap();
    assert_eq!(stats.pages_captured, 3);

    let store = site_harvest::storage::FsObjectStore::open(&bucket).unwrap();
    let keys = store.list("pages/Acme").unwrap().unwrap();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&page_capture_key("Acme", &format!("{}/page1", base))));

    let capture: PageCapture =
        get_json(&store, &page_capture_key("Acme", &format!("{}/page2", base))).unwrap();
    assert_eq!(capture.url, format!("{}/page2", base));
    assert_eq!(capture.content, "<p>Two</p>");
}

#[tokio::test]
async fn test_robots_disallowed_pages_are_never_captured() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /private\n").await;
    mount_page(
        &server,
        "/",
        r#"<a href="/public">Public</a><a href="/private/report">Private</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/public", "<p>ok</p>", 1).await;
    mount_page(&server, "/private/report", "<p>secret</p>", 0).await;

    let config = create_test_config(&[format!("{}/", base)], 3, "");
    let (objects, coordinator) = crawl(config).await;

    assert_eq!(
        captured_urls(&objects),
        vec![format!("{}/", base), format!("{}/public", base)]
    );
    assert_eq!(
        coordinator.page_state(&format!("{}/private/report", base)),
        None,
        "disallowed link should be rejected before it is queued"
    );
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /").await;
    mount_page(&server, "/", "<p>home</p>", 1).await;

    let config = create_test_config(&[format!("{}/", base)], 1, "obey-robots = false");
    let (objects, _) = crawl(config).await;

    assert_eq!(captured_urls(&objects), vec![format!("{}/", base)]);
}

#[tokio::test]
async fn test_depth_limit_is_respected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/d1">1</a>"#, 1).await;
    mount_page(&server, "/d1", r#"<a href="/d2">2</a>"#, 1).await;
    mount_page(&server, "/d2", r#"<a href="/d3">3</a>"#, 1).await;
    mount_page(&server, "/d3", "<p>too deep</p>", 0).await;

    let config = create_test_config(&[format!("{}/", base)], 2, "");
    let objects = Arc::new(MemoryObjectStore::new());
    let stats = Coordinator::new(config, objects.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(stats.pages_captured, 3);
    assert_eq!(stats.rejected_for(RejectReason::DepthExceeded.label()), 1);
    assert!(!captured_urls(&objects).contains(&format!("{}/d3", base)));
}

#[tokio::test]
async fn test_each_url_fetched_and_captured_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Every page links to every other page, plus variants that normalize
    // to the same URL
    let links = r##"<a href="/">Home</a><a href="/a">A</a><a href="/b">B</a>
        <a href="/a#section">A again</a><a href="/b?utm_source=nav">B again</a>"##;
    mount_page(&server, "/", links, 1).await;
    mount_page(&server, "/a", links, 1).await;
    mount_page(&server, "/b", links, 1).await;

    let config = create_test_config(&[format!("{}/", base), format!("{}/a", base)], 4, "");
    let (objects, coordinator) = crawl(config).await;

    assert_eq!(objects.len(), 3);
    for route in ["/", "/a", "/b"] {
        assert_eq!(
            coordinator.page_state(&format!("{}{}", base, route)),
            Some(PageState::Accepted)
        );
    }
}

#[tokio::test]
async fn test_failed_and_off_site_pages_are_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a>
           <a href="/broken">Broken</a>
           <a href="/file.pdf">PDF</a>
           <a href="https://elsewhere.test/">Elsewhere</a>
           <a href="/ok">OK</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<p>fine</p>", 1).await;

    let config = create_test_config(&[format!("{}/", base)], 2, "");
    let objects = Arc::new(MemoryObjectStore::new());
    let mut coordinator = Coordinator::new(config, objects.clone()).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(
        captured_urls(&objects),
        vec![format!("{}/", base), format!("{}/ok", base)]
    );
    assert_eq!(stats.rejected_for(RejectReason::HttpStatus(0).label()), 2);
    assert_eq!(
        stats.rejected_for(RejectReason::ContentMismatch(String::new()).label()),
        1
    );
    assert_eq!(stats.rejected_for(RejectReason::OutsideAllowList.label()), 1);
    assert_eq!(
        coordinator.page_state(&format!("{}/missing", base)),
        Some(PageState::Rejected)
    );
}

#[tokio::test]
async fn test_redirect_is_captured_under_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/old">Old</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/new", r#"<p>moved</p><a href="/new">self</a>"#, 1).await;

    let config = create_test_config(&[format!("{}/", base)], 3, "");
    let (objects, _) = crawl(config).await;

    assert_eq!(
        captured_urls(&objects),
        vec![format!("{}/", base), format!("{}/new", base)]
    );
}

#[tokio::test]
async fn test_redirects_are_held_to_robots_and_allow_list() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = server.address().port();

    mount_robots(&server, "User-agent: *\nDisallow: /private\n").await;
    mount_page(
        &server,
        "/",
        r#"<a href="/go">Go</a><a href="/off">Off</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/private"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/off"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("http://localhost:{}/outside", port)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/private", "<p>secret</p>", 0).await;
    mount_page(&server, "/outside", "<p>elsewhere</p>", 0).await;

    let config = create_test_config(&[format!("{}/", base)], 3, "");
    let objects = Arc::new(MemoryObjectStore::new());
    let mut coordinator = Coordinator::new(config, objects.clone()).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(captured_urls(&objects), vec![format!("{}/", base)]);
    assert_eq!(stats.rejected_for(RejectReason::RobotsDisallowed.label()), 1);
    assert_eq!(stats.rejected_for(RejectReason::OutsideAllowList.label()), 1);
    assert_eq!(
        coordinator.page_state(&format!("{}/go", base)),
        Some(PageState::Rejected)
    );
    assert_eq!(coordinator.page_state(&format!("{}/private", base)), None);
}

#[tokio::test]
async fn test_max_pages_caps_the_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &links, 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>leaf</p>", "text/html"))
        .mount(&server)
        .await;

    let config = create_test_config(&[format!("{}/", base)], 2, "max-pages = 4");
    let (objects, _) = crawl(config).await;

    assert_eq!(objects.len(), 4);
}
