use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Cite-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub seeds: SeedConfig,
}

/// Paper API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the paper API (records live under `{base}/paper/{id}`)
    #[serde(rename = "api-base-url", default = "default_api_base_url")]
    pub api_base_url: String,

    /// Search endpoint used to resolve seed titles
    #[serde(rename = "search-url", default = "default_search_url")]
    pub search_url: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum time between two API calls (milliseconds)
    #[serde(rename = "cooldown-ms", default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Retries for timeouts, connection errors, 429 and 5xx responses
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled on each further retry (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// What to do with a paper whose fetch keeps failing
    #[serde(rename = "on-fetch-failure", default)]
    pub on_fetch_failure: FailurePolicy,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            search_url: default_search_url(),
            timeout_secs: default_timeout_secs(),
            cooldown_ms: default_cooldown_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            on_fetch_failure: FailurePolicy::default(),
        }
    }
}

/// Crawl behaviour when a paper cannot be fetched after all retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the paper as failed and keep crawling
    #[default]
    Skip,
    /// Stop the whole crawl on the first failure
    Abort,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one JSON file per paper
    pub directory: String,

    /// Path to the SQLite run ledger
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// Seed sources
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Titles resolved through the search API
    #[serde(default)]
    pub titles: Vec<String>,

    /// Directory whose file stems are used as additional titles
    #[serde(rename = "titles-dir", default)]
    pub titles_dir: Option<PathBuf>,

    /// Paper ids fetched directly
    #[serde(default)]
    pub ids: Vec<String>,

    /// Largest accepted edit distance between requested and resolved title
    #[serde(rename = "max-title-distance", default = "default_max_title_distance")]
    pub max_title_distance: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            titles: Vec::new(),
            titles_dir: None,
            ids: Vec::new(),
            max_title_distance: default_max_title_distance(),
        }
    }
}

impl SeedConfig {
    /// Returns true if no seed source is configured
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.titles_dir.is_none() && self.ids.is_empty()
    }
}

fn default_api_base_url() -> String {
    "https://api.semanticscholar.org/v1".to_string()
}

fn default_search_url() -> String {
    "https://api.semanticscholar.org/graph/v1/paper/search".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_cooldown_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_title_distance() -> usize {
    crate::paper::DEFAULT_MAX_TITLE_DISTANCE
}
