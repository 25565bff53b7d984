//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small publication site and run the
//! full harvest cycle end-to-end into a temporary output directory.

use folio_harvest::config::{
    Config, CrawlTarget, ExtractionConfig, FetcherConfig, OutputConfig,
};
use folio_harvest::crawler::{Coordinator, HttpFetcher};
use folio_harvest::output::RunStats;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUP: &str = "volume_01";

/// Creates a test configuration harvesting one target from the mock server
fn create_test_config(base_url: &str, root: &Path) -> Config {
    Config {
        fetcher: FetcherConfig {
            user_agent: "TestAgent/1.0".to_string(),
            accept_language: None,
            referer: None,
            timeout_ms: 5000,
            min_delay_ms: 0, // No politeness delay in tests
            max_delay_ms: 0,
        },
        output: OutputConfig {
            root: root.to_string_lossy().into_owned(),
            save_page_snapshots: true,
            save_html: true,
            save_text: true,
            download_attachments: false,
            max_filename_length: 100,
        },
        extraction: ExtractionConfig::default(),
        browser: None,
        targets: vec![CrawlTarget {
            group: GROUP.to_string(),
            seed: format!("{}/volume/01/", base_url),
            default_total_pages: None,
            document_path: None,
        }],
    }
}

/// Listing page with one `<article>` entry per link
fn listing_page(links: &[(&str, &str)], pagination: &str) -> String {
    let entries: String = links
        .iter()
        .map(|(href, title)| {
            format!(
                r#"<article class="post">
                    <h2 class="entry-title"><a href="{href}">{title}</a></h2>
                    <time>2021-03-04</time>
                </article>"#
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Volume 1</title></head><body>
            <nav class="menu"><a href="/">Home</a></nav>
            {entries}
            <div class="pagination">{pagination}</div>
        </body></html>"#
    )
}

fn document_page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Library</title></head><body>
            <nav><a href="/">Home</a></nav>
            <article>
                <h1 class="entry-title">{title}</h1>
                <div class="entry-content"><p>{body}</p></div>
            </article>
            <footer>Copyright</footer>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn harvest(config: Config) -> RunStats {
    let fetcher = HttpFetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let mut coordinator = Coordinator::new(config, fetcher);
    coordinator.run().await.expect("Harvest should not fail");
    coordinator.stats().clone()
}

fn group_file(root: &Path, name: &str) -> PathBuf {
    root.join(GROUP).join(name)
}

#[tokio::test]
async fn test_full_harvest_with_pagination() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(
            &[("/articles/one", "First Article"), ("/articles/two", "Second Article")],
            r#"<a href="/volume/01/">1</a><a href="/volume/01/page/2/">2</a>"#,
        ),
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/volume/01/page/2/",
        listing_page(&[("/articles/three", "Third Article")], ""),
        1,
    )
    .await;
    mount_html(&mock_server, "/articles/one", document_page("First Article", "Body of the first."), 1).await;
    mount_html(&mock_server, "/articles/two", document_page("Second Article", "Body of the second."), 1).await;
    mount_html(&mock_server, "/articles/three", document_page("Third Article", "Body of the third."), 1).await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let stats = harvest(config).await;

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.skipped, 0);

    let root = output.path();
    assert!(group_file(root, "pages/page_1.html").exists());
    assert!(group_file(root, "pages/page_2.html").exists());
    assert!(group_file(root, "page1_article1_First_Article.html").exists());
    assert!(group_file(root, "page1_article2_Second_Article.html").exists());
    assert!(group_file(root, "page2_article1_Third_Article.html").exists());

    let text = std::fs::read_to_string(group_file(root, "page1_article1_First_Article.txt")).unwrap();
    let expected = format!(
        "First Article\nDate: 2021-03-04\n\n{}\n\nBody of the first.\n\n",
        "=".repeat(50)
    );
    assert_eq!(text, expected);

    let html = std::fs::read_to_string(group_file(root, "page2_article1_Third_Article.html")).unwrap();
    assert!(html.contains("Body of the third."));
}

#[tokio::test]
async fn test_rerun_skips_saved_documents() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path();

    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(
            &[("/articles/one", "First Article"), ("/articles/two", "Second Article")],
            "",
        ),
        1,
    )
    .await;
    // Saved by an earlier run: must not be requested again
    mount_html(&mock_server, "/articles/one", document_page("First Article", "Old body."), 0).await;
    mount_html(&mock_server, "/articles/two", document_page("Second Article", "New body."), 1).await;

    std::fs::create_dir_all(root.join(GROUP)).unwrap();
    std::fs::write(group_file(root, "page1_article1_First_Article.html"), "earlier html").unwrap();
    std::fs::write(group_file(root, "page1_article1_First_Article.txt"), "earlier text").unwrap();

    let config = create_test_config(&mock_server.uri(), root);
    let stats = harvest(config).await;

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.succeeded, 1);

    // Existing artifacts untouched
    let text = std::fs::read_to_string(group_file(root, "page1_article1_First_Article.txt")).unwrap();
    assert_eq!(text, "earlier text");
    assert!(group_file(root, "page1_article2_Second_Article.txt").exists());
}

#[tokio::test]
async fn test_partially_saved_document_is_refetched() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path();

    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(&[("/articles/one", "First Article")], ""),
        1,
    )
    .await;
    mount_html(&mock_server, "/articles/one", document_page("First Article", "Body."), 1).await;

    // Only the HTML artifact exists; the text one is still missing
    std::fs::create_dir_all(root.join(GROUP)).unwrap();
    std::fs::write(group_file(root, "page1_article1_First_Article.html"), "earlier html").unwrap();

    let config = create_test_config(&mock_server.uri(), root);
    let stats = harvest(config).await;

    assert_eq!(stats.succeeded, 1);
    let html = std::fs::read_to_string(group_file(root, "page1_article1_First_Article.html")).unwrap();
    assert_eq!(html, "earlier html");
    assert!(group_file(root, "page1_article1_First_Article.txt").exists());
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // Links a, b on page 1 and a, c on page 2
    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(
            &[("/articles/a", "Article A"), ("/articles/b", "Article B")],
            r#"<a href="/volume/01/page/2/">2</a>"#,
        ),
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/volume/01/page/2/",
        listing_page(&[("/articles/a", "Article A"), ("/articles/c", "Article C")], ""),
        1,
    )
    .await;
    mount_html(&mock_server, "/articles/a", document_page("Article A", "Body A."), 1).await;
    mount_html(&mock_server, "/articles/b", document_page("Article B", "Body B."), 1).await;
    mount_html(&mock_server, "/articles/c", document_page("Article C", "Body C."), 1).await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let stats = harvest(config).await;

    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.succeeded, 3);
}

#[tokio::test]
async fn test_failed_document_does_not_stop_run() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(
            &[
                ("/articles/broken", "Broken Article"),
                ("/articles/fine", "Fine Article"),
            ],
            "",
        ),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/articles/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1) // No retry
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/articles/fine", document_page("Fine Article", "Still saved."), 1).await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let stats = harvest(config).await;

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);
    assert!(!group_file(output.path(), "page1_article1_Broken_Article.html").exists());
    assert!(group_file(output.path(), "page1_article2_Fine_Article.txt").exists());
}

#[tokio::test]
async fn test_document_without_content_is_skipped() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(&[("/articles/empty", "Empty Article")], ""),
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/articles/empty",
        "<html><body><nav><p>Only navigation here</p></nav></body></html>".to_string(),
        1,
    )
    .await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let stats = harvest(config).await;

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);
    assert!(!group_file(output.path(), "page1_article1_Empty_Article.html").exists());
    assert!(!group_file(output.path(), "page1_article1_Empty_Article.txt").exists());
}

#[tokio::test]
async fn test_unreachable_seed_is_counted() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/volume/01/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let stats = harvest(config).await;

    assert_eq!(stats.pages_failed, 1);
    assert_eq!(stats.processed, 0);
}

#[tokio::test]
async fn test_attachment_downloaded_with_document_referer() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(&[("/books/fasting", "Book of Fasting")], ""),
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/books/fasting",
        r#"<html><body><article>
            <h1 class="entry-title">Book of Fasting</h1>
            <p>Introduction to the book.</p>
            <a id="pdf-download" href="/files/fasting.pdf">Download PDF</a>
        </article></body></html>"#
            .to_string(),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/files/fasting.pdf"))
        .and(header("referer", format!("{}/books/fasting", base_url).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 test".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, output.path());
    config.output.download_attachments = true;
    let stats = harvest(config).await;

    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.attachments_saved, 1);

    let pdf = group_file(
        output.path(),
        "page1_article1_Book_of_Fasting_downloads/fasting.pdf",
    );
    assert_eq!(std::fs::read(pdf).unwrap(), b"%PDF-1.4 test");
}

#[tokio::test]
async fn test_embedded_articles_saved_without_fetching() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path();

    mount_html(
        &mock_server,
        "/volume/01/",
        r##"<html><body>
            <div class="nav flex-column nav-pills">
                <a class="nav-link" href="#v-pills-1">First Letter</a>
                <a class="nav-link" href="#v-pills-2">Second Letter</a>
            </div>
            <div class="tab-content">
                <div class="tab-pane fade show active" id="v-pills-1">
                    <h2>First Letter</h2>
                    <p>Opening of the first letter.</p>
                </div>
                <div class="tab-pane fade" id="v-pills-2">
                    <h2>Second Letter</h2>
                    <p>Opening of the second letter.</p>
                </div>
            </div>
        </body></html>"##
            .to_string(),
        1,
    )
    .await;

    let config = create_test_config(&mock_server.uri(), root);
    let stats = harvest(config).await;

    // Only the listing itself was requested
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 0);

    let text = std::fs::read_to_string(group_file(root, "page1_article1_First_Letter.txt")).unwrap();
    assert!(text.starts_with("First Letter\n"));
    assert!(text.contains("Opening of the first letter."));
    assert!(!text.contains("second letter"));

    let html = std::fs::read_to_string(group_file(root, "page1_article2_Second_Letter.html")).unwrap();
    assert!(html.contains(r#"id="v-pills-2""#));
    assert!(!html.contains("first letter"));
}

#[tokio::test]
async fn test_write_failure_counted_and_run_continues() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path();

    mount_html(
        &mock_server,
        "/volume/01/",
        listing_page(
            &[("/articles/one", "First Article"), ("/articles/two", "Second Article")],
            "",
        ),
        1,
    )
    .await;
    mount_html(&mock_server, "/articles/one", document_page("First Article", "Body one."), 1).await;
    mount_html(&mock_server, "/articles/two", document_page("Second Article", "Body two."), 1).await;

    // A directory where the text artifact should go makes that write fail
    std::fs::create_dir_all(group_file(root, "page1_article1_First_Article.txt")).unwrap();

    let config = create_test_config(&mock_server.uri(), root);
    let stats = harvest(config).await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);
    assert!(group_file(root, "page1_article1_First_Article.txt").is_dir());
    assert!(group_file(root, "page1_article2_Second_Article.html").exists());
    assert!(group_file(root, "page1_article2_Second_Article.txt").exists());
}
