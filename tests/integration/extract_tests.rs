//! Integration tests for the extraction pass
//!
//! Captures are written to a filesystem object store in a temp directory,
//! then extracted into a SQLite document store.

use site_harvest::config::ExtractionConfig;
use site_harvest::extract::{ExtractionRules, Extractor};
use site_harvest::storage::{
    put_json, DocumentStore, FsObjectStore, ObjectStore, PageCapture, SqliteDocumentStore,
};
use site_harvest::url::page_capture_key;
use tempfile::TempDir;

const HOME: &str = r#"<html><head>
    <meta property="og:title" content="Acme | Design">
    <meta name="description" content="Design on demand">
    </head><body><p>We design.</p><p>You&nbsp;ship.</p></body></html>"#;

const SPA: &str = r#"<html><head><meta property="og:title" content="Work"></head><body>
    <div id="__next"></div>
    <script id="__NEXT_DATA__" type="application/json">
    {"props": {"pageProps": {"title": "Ignored", "sections": [
        {"paragraph": "<p>Case studies</p>"},
        {"body": "for <em>every</em> team"}
    ]}}}
    </script></body></html>"#;

struct Fixture {
    _dir: TempDir,
    objects: FsObjectStore,
    db_path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let objects = FsObjectStore::open(dir.path().join("bucket")).unwrap();
        let db_path = dir.path().join("documents.db");
        Self {
            _dir: dir,
            objects,
            db_path,
        }
    }

    fn capture(&self, url: &str, content: &str) -> String {
        let key = page_capture_key("Acme", url);
        let capture = PageCapture {
            url: url.to_string(),
            content: content.to_string(),
        };
        put_json(&self.objects, &key, &capture).unwrap();
        key
    }

    fn documents(&self) -> SqliteDocumentStore {
        SqliteDocumentStore::open(&self.db_path, "Acme").unwrap()
    }
}

fn rules() -> ExtractionRules {
    ExtractionRules::from_config(&ExtractionConfig::default()).unwrap()
}

fn invalid_pages() -> Vec<String> {
    ExtractionConfig::default().invalid_pages
}

#[test]
fn test_one_record_per_url_and_excluded_pages_skipped() {
    let fixture = Fixture::new();
    fixture.capture("https://acme.test/", HOME);
    fixture.capture("https://acme.test/work", SPA);
    let author_key = fixture.capture("https://acme.test/blog/author/jane", HOME);
    let tag_key = fixture.capture("https://acme.test/blog/tag/ux", HOME);
    assert!(author_key.contains("-blog-author-"));
    assert!(tag_key.contains("-blog-tag-"));

    let mut documents = fixture.documents();
    let stats = Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();

    assert_eq!(stats.keys_listed, 4);
    assert_eq!(stats.skipped_invalid, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(documents.count().unwrap(), 2);

    let home = documents.find_by_url("https://acme.test/").unwrap().unwrap();
    assert_eq!(home.title.as_deref(), Some("Acme | Design"));
    assert_eq!(home.description.as_deref(), Some("Design on demand"));
    assert_eq!(home.texts.as_deref(), Some("We design. You\u{a0}ship."));

    let work = documents.find_by_url("https://acme.test/work").unwrap().unwrap();
    assert_eq!(work.title.as_deref(), Some("Work"));
    assert_eq!(work.description, None);
    assert_eq!(work.texts.as_deref(), Some("Case studies for every team"));

    assert!(documents
        .find_by_url("https://acme.test/blog/author/jane")
        .unwrap()
        .is_none());
}

#[test]
fn test_rerun_is_idempotent() {
    let fixture = Fixture::new();
    fixture.capture("https://acme.test/", HOME);
    fixture.capture("https://acme.test/work", SPA);

    let mut documents = fixture.documents();
    Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();
    let first = documents.find_by_url("https://acme.test/").unwrap().unwrap();

    let stats = Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();
    let second = documents.find_by_url("https://acme.test/").unwrap().unwrap();

    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.replaced, 2);
    assert_eq!(documents.count().unwrap(), 2);
    assert_eq!(first.texts, second.texts);
    assert!(second.updated_at >= first.updated_at);
}

#[test]
fn test_recapture_replaces_record() {
    let fixture = Fixture::new();
    fixture.capture("https://acme.test/", HOME);

    let mut documents = fixture.documents();
    Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();

    fixture.capture("https://acme.test/", "<p>Rebranded</p>");
    Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();

    let home = documents.find_by_url("https://acme.test/").unwrap().unwrap();
    assert_eq!(documents.count().unwrap(), 1);
    assert_eq!(home.title, None);
    assert_eq!(home.texts.as_deref(), Some("Rebranded"));
}

#[test]
fn test_full_reload_drops_stale_records() {
    let fixture = Fixture::new();
    fixture.capture("https://acme.test/", HOME);
    fixture.capture("https://acme.test/old", HOME);

    let mut documents = fixture.documents();
    Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();
    assert_eq!(documents.count().unwrap(), 2);
    documents.close().unwrap();

    // Start over with only one capture in a fresh bucket
    let fresh = FsObjectStore::open(fixture.db_path.with_file_name("bucket2")).unwrap();
    let capture = PageCapture {
        url: "https://acme.test/".to_string(),
        content: HOME.to_string(),
    };
    put_json(&fresh, &page_capture_key("Acme", &capture.url), &capture).unwrap();

    let mut documents = fixture.documents();
    let stats = Extractor::new(&fresh, &mut documents, rules(), "Acme", invalid_pages())
        .run(true)
        .unwrap();

    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.inserted, 1);
    assert_eq!(documents.count().unwrap(), 1);
    assert!(documents.find_by_url("https://acme.test/old").unwrap().is_none());
}

#[test]
fn test_capture_with_long_url_is_extracted() {
    let fixture = Fixture::new();
    let url = format!("https://acme.test/blog/{}?ref=newsletter", "a".repeat(300));
    fixture.capture(&url, HOME);

    let mut documents = fixture.documents();
    let stats = Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();

    assert_eq!(stats.inserted, 1);
    let record = documents.find_by_url(&url).unwrap().unwrap();
    assert_eq!(record.title.as_deref(), Some("Acme | Design"));
}

#[test]
fn test_missing_namespace_is_not_an_error() {
    let fixture = Fixture::new();
    assert_eq!(fixture.objects.list("pages/Acme").unwrap(), None);

    let mut documents = fixture.documents();
    let stats = Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();

    assert_eq!(stats.keys_listed, 0);
    assert_eq!(documents.count().unwrap(), 0);
}

#[test]
fn test_undecodable_capture_does_not_abort_batch() {
    let fixture = Fixture::new();
    fixture.capture("https://acme.test/a", "<p>A</p>");
    fixture
        .objects
        .put(
            "pages/Acme/acme.test-corrupt.json",
            &serde_json::json!({"content": 42}),
        )
        .unwrap();
    fixture.capture("https://acme.test/z", "<p>Z</p>");

    let mut documents = fixture.documents();
    let stats = Extractor::new(&fixture.objects, &mut documents, rules(), "Acme", invalid_pages())
        .run(false)
        .unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.inserted, 2);
    assert_eq!(documents.count().unwrap(), 2);
}
