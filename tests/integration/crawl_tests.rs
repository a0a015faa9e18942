//! Integration tests for discovery, extraction and delivery
//!
//! These tests use wiremock to stand in for both the library site and the
//! ingestion endpoint, and tempfile for the corpus and database files.

use bookwise_harvest::config::{parse_config, Config};
use bookwise_harvest::crawler::{
    build_http_client, run_discovery, run_extraction, run_harvest, Discoverer, HarvestMode,
    RetryPolicy, StopReason,
};
use bookwise_harvest::record::{book_id, SiteProfile, Source};
use bookwise_harvest::sink::SqliteSink;
use bookwise_harvest::url::{read_corpus, write_corpus};
use bookwise_harvest::{ConfigError, HarvestError};
use std::collections::BTreeSet;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(base_url: &str, dir: &TempDir, sink: &str) -> Config {
    let toml = format!(
        r#"
[site]
source = "bibliometro"
base-url = "{base_url}"

[http]
timeout-secs = 10
connect-timeout-secs = 5
max-retries = 0
backoff-ms = 1

[discovery]
max-category-pages = 5
page-delay-ms = 0
empty-page-limit = 2

[extraction]
batch-size = 10
min-delay-ms = 0
max-delay-ms = 0

[output]
urls-path = "{urls}"

{sink}
"#,
        base_url = base_url,
        urls = dir.path().join("urls.txt").display(),
        sink = sink,
    );
    parse_config(&toml).expect("test config is valid")
}

fn http_sink_section(base_url: &str) -> String {
    format!(
        r#"
[sink]
kind = "http"
endpoint = "{}/api/books/batch"
api-secret = "s3cret"
"#,
        base_url
    )
}

fn listing_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">libro</a>"#, href))
        .collect();
    format!(
        r#"<html><body><nav><a href="/quienes-somos/">Nosotros</a></nav>{}</body></html>"#,
        anchors
    )
}

fn detail_page(title: &str, branches: &[&str]) -> String {
    let items: String = branches
        .iter()
        .map(|b| format!("<li>{}</li>", b))
        .collect();
    format!(
        r#"<html><head><title>{title} - Bibliometro</title></head><body>
            <div class="book-cover"><img src="/uploads/cover.jpg"></div>
            <h1 class="entry-title">{title}</h1>
            <h4>Autora de prueba</h4>
            <ul><li><strong>Páginas:</strong> 210 páginas</li></ul>
            <h3 class="tit-h3">Resumen de libro</h3>
            <p>Un resumen.</p>
            <h4>Ubicación de este libro</h4>
            <ul>{items}</ul>
        </body></html>"#,
        title = title,
        items = items
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_category_stops_after_two_empty_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/catalogo/"))
        .and(query_param("categoria", "Literatura"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["/libros/a/", "/libros/b/#respond"])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    // Pages 2 and 3 only repeat known links
    for page in [2, 3] {
        Mock::given(method("GET"))
            .and(path(format!("/catalogo/page/{}/", page)))
            .and(query_param("categoria", "Literatura"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["/libros/a/"])))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/catalogo/page/4/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["/libros/z/"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &dir, &http_sink_section(&base_url));
    let stats = run_discovery(&config).await.unwrap();

    assert_eq!(stats.total_urls, 2);
    assert_eq!(stats.category_urls, 2);

    let corpus = read_corpus(&dir.path().join("urls.txt")).unwrap();
    assert_eq!(
        corpus,
        vec![
            format!("{}/libros/a/", base_url),
            format!("{}/libros/b/", base_url)
        ]
    );
}

#[tokio::test]
async fn test_page_with_one_known_link_adds_two() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/catalogo/"))
        .and(query_param("categoria", "Arte"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[
            "/libros/known/",
            "/libros/new-1/",
            "/libros/new-2/",
        ])))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&Default::default()).unwrap();
    let profile = SiteProfile::for_source(Source::Bibliometro, Some(&base_url)).unwrap();
    let mut settings = bookwise_harvest::config::DiscoveryConfig::default();
    settings.page_delay_ms = 0;

    let mut discoverer = Discoverer::new(client, profile, settings, RetryPolicy::none());
    discoverer.record_page_links(vec![format!("{}/libros/known/", base_url)]);

    let outcome = discoverer.crawl_category("Arte").await;

    assert_eq!(outcome.urls_added, 2);
    assert_eq!(outcome.pages_fetched, 1);
    // Page 2 is not mocked, so the 404 ends the category
    assert_eq!(outcome.stop_reason, StopReason::FetchFailed);
    assert_eq!(discoverer.urls().len(), 3);
}

#[tokio::test]
async fn test_page_ceiling_stops_pagination() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Every page yields a fresh link, so only the ceiling can stop the walk
    for page in 1..=3 {
        let page_path = if page == 1 {
            "/catalogo/".to_string()
        } else {
            format!("/catalogo/page/{}/", page)
        };
        let link = format!("/libros/libro-{}/", page);
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[&link])))
            .mount(&mock_server)
            .await;
    }

    let client = build_http_client(&Default::default()).unwrap();
    let profile = SiteProfile::for_source(Source::Bibliometro, Some(&base_url)).unwrap();
    let mut settings = bookwise_harvest::config::DiscoveryConfig::default();
    settings.page_delay_ms = 0;
    settings.max_category_pages = 2;

    let mut discoverer = Discoverer::new(client, profile, settings, RetryPolicy::none());
    let outcome = discoverer.crawl_category("Poesía").await;

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.stop_reason, StopReason::PageCeiling);
}

#[tokio::test]
async fn test_bad_sitemaps_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/sitemap_index.xml",
        "<html><body>Not a sitemap".to_string(),
    )
    .await;

    // /wp-sitemap.xml is not mounted and answers 404

    mount_page(
        &mock_server,
        "/post-sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{base}/libros/rayuela/</loc></url>
              <url><loc>{base}/quienes-somos/</loc></url>
            </urlset>"#,
            base = base_url
        ),
    )
    .await;

    let config = create_test_config(&base_url, &dir, &http_sink_section(&base_url));
    let stats = run_discovery(&config).await.unwrap();

    assert_eq!(stats.sitemaps_tried, 4);
    assert_eq!(stats.sitemaps_parsed, 1);
    assert_eq!(stats.sitemap_urls, 1);

    let corpus = read_corpus(&dir.path().join("urls.txt")).unwrap();
    assert_eq!(corpus, vec![format!("{}/libros/rayuela/", base_url)]);
}

#[tokio::test]
async fn test_full_extraction_to_http_sink() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/libros/el-tunel/",
        detail_page("El Túnel", &["Baquedano 2", "Bellavista 0"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/libros/sin-titulo/",
        "<html><body><p>Mantención</p></body></html>".to_string(),
    )
    .await;
    // /libros/borrado/ is not mounted and answers 404

    Mock::given(method("POST"))
        .and(path("/api/books/batch"))
        .and(header("x-api-secret", "s3cret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"message":"1 books upserted"}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &dir, &http_sink_section(&base_url));
    let urls: BTreeSet<String> = ["/libros/el-tunel/", "/libros/sin-titulo/", "/libros/borrado/"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    write_corpus(&dir.path().join("urls.txt"), &urls).unwrap();

    let stats = run_extraction(&config).await.unwrap();

    assert_eq!(stats.urls_loaded, 3);
    assert_eq!(stats.records_extracted, 1);
    assert_eq!(stats.skipped_http, 1);
    assert_eq!(stats.skipped_no_title, 1);
    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(stats.records_delivered, 1);

    let requests = mock_server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/api/books/batch")
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&upload.body).unwrap();
    let books = payload.as_array().unwrap();

    assert_eq!(books.len(), 1);
    let book = &books[0];
    assert_eq!(book["id"], book_id(Source::Bibliometro, "El Túnel").as_str());
    assert_eq!(book["title"], "El Túnel");
    assert_eq!(book["author"], "Autora de prueba");
    assert_eq!(book["pages"], 210);
    assert_eq!(book["difficulty"], 3);
    assert_eq!(book["source"], "bibliometro");
    assert_eq!(book["summary"], "Un resumen.");
    assert_eq!(book["imageUrl"], format!("{}/uploads/cover.jpg", base_url).as_str());
    assert_eq!(book["locations"].as_array().unwrap().len(), 1);
    assert_eq!(book["locations"][0]["branch"], "Baquedano");
    assert_eq!(book["locations"][0]["stock"], 2);
}

#[tokio::test]
async fn test_rejected_batch_does_not_stop_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/libros/a/", detail_page("Libro A", &["Baquedano 1"])).await;
    mount_page(&mock_server, "/libros/b/", detail_page("Libro B", &["Tobalaba 3"])).await;

    // First upload fails, every later one succeeds
    Mock::given(method("POST"))
        .and(path("/api/books/batch"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/books/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"message":"ok"}"#))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &dir, &http_sink_section(&base_url));
    config.extraction.batch_size = 1;

    let urls: BTreeSet<String> = ["/libros/a/", "/libros/b/"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    write_corpus(&dir.path().join("urls.txt"), &urls).unwrap();

    let stats = run_extraction(&config).await.unwrap();

    assert_eq!(stats.records_extracted, 2);
    assert_eq!(stats.batches_failed, 1);
    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(stats.records_delivered, 1);
}

#[tokio::test]
async fn test_transient_sink_failure_is_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/libros/a/", detail_page("Libro A", &[])).await;

    Mock::given(method("POST"))
        .and(path("/api/books/batch"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/books/batch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &dir, &http_sink_section(&base_url));
    config.http.max_retries = 2;

    let urls: BTreeSet<String> = [format!("{}/libros/a/", base_url)].into_iter().collect();
    write_corpus(&dir.path().join("urls.txt"), &urls).unwrap();

    let stats = run_extraction(&config).await.unwrap();

    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(stats.batches_failed, 0);
}

#[tokio::test]
async fn test_extraction_into_sqlite_sink() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("books.db");

    mount_page(
        &mock_server,
        "/libros/rayuela/",
        detail_page("Rayuela", &["Baquedano 1", "Los Héroes 4"]),
    )
    .await;

    let sink = format!(
        r#"
[sink]
kind = "sqlite"
database-path = "{}"
"#,
        db_path.display()
    );
    let config = create_test_config(&base_url, &dir, &sink);

    let urls: BTreeSet<String> = [format!("{}/libros/rayuela/", base_url)].into_iter().collect();
    write_corpus(&dir.path().join("urls.txt"), &urls).unwrap();

    let stats = run_extraction(&config).await.unwrap();
    assert_eq!(stats.batches_delivered, 1);

    // A second run upserts into the same row
    let stats = run_extraction(&config).await.unwrap();
    assert_eq!(stats.records_delivered, 1);

    let store = SqliteSink::new(&db_path).unwrap();
    assert_eq!(store.count_books().unwrap(), 1);

    let book = store
        .get_book(&book_id(Source::Bibliometro, "Rayuela"))
        .unwrap()
        .unwrap();
    assert_eq!(book.title, "Rayuela");
    assert_eq!(book.locations.len(), 2);
    assert!(book.tags.contains("bibliometro"));
}

#[tokio::test]
async fn test_extraction_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/libros/a/", detail_page("Libro A", &[])).await;
    Mock::given(method("GET"))
        .and(path("/libros/b/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Libro B", &[])))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/books/batch"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &dir, &http_sink_section(&base_url));
    config.extraction.limit = 1;

    let urls: BTreeSet<String> = ["/libros/a/", "/libros/b/"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    write_corpus(&dir.path().join("urls.txt"), &urls).unwrap();

    let stats = run_extraction(&config).await.unwrap();

    assert_eq!(stats.urls_loaded, 1);
    assert_eq!(stats.records_extracted, 1);
}

#[tokio::test]
async fn test_missing_secret_aborts_before_any_request() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["/libros/a/"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let sink = format!(
        r#"
[sink]
kind = "http"
endpoint = "{}/api/books/batch"
secret-env = "BOOKWISE_TEST_SECRET_THAT_IS_NEVER_SET"
"#,
        base_url
    );
    let config = create_test_config(&base_url, &dir, &sink);

    let result = run_harvest(&config, HarvestMode::Full).await;

    assert!(matches!(
        result,
        Err(HarvestError::Config(ConfigError::MissingSecret { .. }))
    ));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
    assert!(!dir.path().join("urls.txt").exists());
}

#[tokio::test]
async fn test_full_harvest_discovers_then_extracts() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/catalogo/"))
        .and(query_param("categoria", "Literatura"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["/libros/rayuela/"])))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/libros/rayuela/", detail_page("Rayuela", &["Baquedano 1"])).await;
    Mock::given(method("POST"))
        .and(path("/api/books/batch"))
        .and(header("x-api-secret", "s3cret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &dir, &http_sink_section(&base_url));
    let report = run_harvest(&config, HarvestMode::Full).await.unwrap();

    assert_eq!(report.discovery.unwrap().total_urls, 1);
    let extraction = report.extraction.unwrap();
    assert_eq!(extraction.records_extracted, 1);
    assert_eq!(extraction.batches_delivered, 1);
}
