use serde::Deserialize;

/// Default browser-style user agent sent with every crawl request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Main configuration structure for Site-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Identity of the crawled site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site/company name; selects the `pages/<name>` prefix and the
    /// document collection
    pub name: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs the crawl starts from (depth 0)
    pub seeds: Vec<String>,

    /// Domains the crawler may fetch from; each entry also covers its subdomains
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Maximum link depth from a seed URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whether robots.txt disallow rules are honored
    #[serde(rename = "obey-robots", default = "default_true")]
    pub obey_robots: bool,

    /// Whether robots.txt Crawl-delay stretches the per-domain delay
    #[serde(rename = "respect-crawl-delay", default = "default_true")]
    pub respect_crawl_delay: bool,

    /// Maximum number of fetches in flight
    #[serde(
        rename = "max-concurrent-requests",
        default = "default_max_concurrent_requests"
    )]
    pub max_concurrent_requests: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "download-delay-ms", default)]
    pub download_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// Stop scheduling after this many captures (0 = unlimited)
    #[serde(rename = "max-pages", default)]
    pub max_pages: u64,
}

/// Storage locations
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory acting as the object store bucket
    #[serde(rename = "object-store-path")]
    pub object_store_path: String,

    /// Path to the SQLite document store
    #[serde(rename = "document-store-path")]
    pub document_store_path: String,
}

/// Extraction rules and filters
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Substrings that mark a capture key as an archive page to skip
    #[serde(rename = "invalid-pages", default = "default_invalid_pages")]
    pub invalid_pages: Vec<String>,

    /// Selector whose `content` attribute carries the title
    #[serde(rename = "title-selector", default = "default_title_selector")]
    pub title_selector: String,

    /// Selector whose `content` attribute carries the description
    #[serde(
        rename = "description-selector",
        default = "default_description_selector"
    )]
    pub description_selector: String,

    /// Selector whose text nodes make up the body text
    #[serde(rename = "text-selector", default = "default_text_selector")]
    pub text_selector: String,

    /// Selector of the script tag carrying the embedded JSON payload
    #[serde(rename = "payload-selector", default = "default_payload_selector")]
    pub payload_selector: String,

    /// Keys harvested from the payload, in order
    #[serde(rename = "payload-keys", default = "default_payload_keys")]
    pub payload_keys: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            invalid_pages: default_invalid_pages(),
            title_selector: default_title_selector(),
            description_selector: default_description_selector(),
            text_selector: default_text_selector(),
            payload_selector: default_payload_selector(),
            payload_keys: default_payload_keys(),
        }
    }
}

fn default_max_depth() -> u32 {
    4
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_requests() -> u32 {
    16
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_invalid_pages() -> Vec<String> {
    ["-blog-author-", "-blog-authors-", "-blog-category-", "-blog-tag-"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_title_selector() -> String {
    r#"meta[property="og:title"]"#.to_string()
}

fn default_description_selector() -> String {
    r#"meta[name="description"]"#.to_string()
}

fn default_text_selector() -> String {
    "p".to_string()
}

fn default_payload_selector() -> String {
    "script#__NEXT_DATA__".to_string()
}

fn default_payload_keys() -> Vec<String> {
    ["paragraph", "body", "content"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
