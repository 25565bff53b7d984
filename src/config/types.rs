use serde::Deserialize;

/// Main configuration structure for Folio-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub browser: Option<BrowserConfig>,
    #[serde(rename = "target", default)]
    pub targets: Vec<CrawlTarget>,
}

/// Network behaviour of the fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Browser-impersonating User-Agent header
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Optional Accept-Language header
    #[serde(rename = "accept-language", default)]
    pub accept_language: Option<String>,

    /// Optional Referer sent with page and document requests
    #[serde(default)]
    pub referer: Option<String>,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Lower bound of the politeness delay (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the politeness delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Output layout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory; each target writes into `<root>/<group>/`
    pub root: String,

    /// Save listing pages as `pages/page_<n>.html`
    #[serde(rename = "save-page-snapshots", default = "default_true")]
    pub save_page_snapshots: bool,

    /// Save the raw HTML of each document
    #[serde(rename = "save-html", default = "default_true")]
    pub save_html: bool,

    /// Save the rendered plain text of each document
    #[serde(rename = "save-text", default = "default_true")]
    pub save_text: bool,

    /// Download attachments (PDFs) linked from documents
    #[serde(rename = "download-attachments", default)]
    pub download_attachments: bool,

    /// Maximum length of the sanitized slug in document filenames
    #[serde(rename = "max-filename-length", default = "default_max_filename_length")]
    pub max_filename_length: usize,
}

/// Heuristic tuning for link and content extraction
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// CSS selector for listing entry containers
    #[serde(rename = "entry-container", default = "default_entry_container")]
    pub entry_container: String,

    /// Ordered CSS selectors tried when locating a document's content root
    #[serde(rename = "content-selectors", default = "default_content_selectors")]
    pub content_selectors: Vec<String>,

    /// Minimum text length kept when falling back to the page body
    #[serde(rename = "min-text-length", default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Path substring that identifies document links (e.g. "/articles/")
    #[serde(rename = "document-path", default)]
    pub document_path: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            entry_container: default_entry_container(),
            content_selectors: default_content_selectors(),
            min_text_length: default_min_text_length(),
            document_path: None,
        }
    }
}

/// Browser-driven page source for sites that need a rendered DOM
///
/// Chrome is launched locally unless `debug-url` points at one that is
/// already running.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Chrome/Chromium binary; auto-detected when unset
    #[serde(rename = "chrome-executable", default)]
    pub chrome_executable: Option<String>,

    /// DevTools websocket of a running browser (`ws://127.0.0.1:9222/...`)
    #[serde(rename = "debug-url", default)]
    pub debug_url: Option<String>,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// CSS selector whose presence means the page has rendered
    #[serde(rename = "ready-marker", default = "default_ready_marker")]
    pub ready_marker: String,

    /// How long to wait for the ready marker (milliseconds)
    #[serde(rename = "wait-timeout-ms", default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Interval between marker checks (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            debug_url: None,
            headless: true,
            ready_marker: default_ready_marker(),
            wait_timeout_ms: default_wait_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// A seed URL plus the group its documents are filed under
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlTarget {
    /// Volume/category identifier, used as the output subdirectory
    pub group: String,

    /// First listing page
    pub seed: String,

    /// Total page count to assume when the seed page has no pagination markup
    #[serde(rename = "default-total-pages", default)]
    pub default_total_pages: Option<u32>,

    /// Overrides `extraction.document-path` for this target
    #[serde(rename = "document-path", default)]
    pub document_path: Option<String>,
}

impl CrawlTarget {
    /// Document path substring in effect for this target
    pub fn document_path<'a>(&'a self, extraction: &'a ExtractionConfig) -> Option<&'a str> {
        self.document_path
            .as_deref()
            .or(extraction.document_path.as_deref())
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_min_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    3_000
}

fn default_max_filename_length() -> usize {
    100
}

fn default_entry_container() -> String {
    "article".to_string()
}

fn default_content_selectors() -> Vec<String> {
    [
        ".article-content",
        ".entry-content",
        ".post-content",
        ".content",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_text_length() -> usize {
    10
}

fn default_ready_marker() -> String {
    "article".to_string()
}

fn default_wait_timeout_ms() -> u64 {
    20_000
}

fn default_poll_interval_ms() -> u64 {
    500
}
