use crate::record::Source;
use serde::Deserialize;

/// Main configuration structure for Bookwise-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub sink: SinkConfig,
}

/// Target site selection
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Which library site to harvest
    pub source: Source,

    /// Overrides the built-in base URL for the source (useful for mirrors and tests)
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,
}

/// Outbound HTTP behaviour shared by discovery, extraction and delivery
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries (milliseconds), doubled per attempt
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// URL discovery behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Hard ceiling on pages visited per category
    #[serde(rename = "max-category-pages", default = "default_max_category_pages")]
    pub max_category_pages: u32,

    /// Delay between consecutive category page fetches (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Consecutive pages without new URLs before a category is considered exhausted
    #[serde(rename = "empty-page-limit", default = "default_empty_page_limit")]
    pub empty_page_limit: u32,
}

/// Detail extraction behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Records per delivered batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Lower bound of the randomized delay between detail fetches (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay between detail fetches (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Only process the first N URLs of the corpus (0 means all)
    #[serde(default)]
    pub limit: usize,
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the newline-delimited URL corpus
    #[serde(rename = "urls-path", default = "default_urls_path")]
    pub urls_path: String,
}

/// Which ingestion sink receives the batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Http,
    Sqlite,
}

/// Ingestion sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Batch ingestion endpoint (HTTP sink)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// SQLite database file (SQLite sink)
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Shared secret sent as `x-api-secret`; prefer the environment variable
    #[serde(rename = "api-secret", default)]
    pub api_secret: Option<String>,

    /// Environment variable consulted when `api-secret` is not set
    #[serde(rename = "secret-env", default = "default_secret_env")]
    pub secret_env: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; Bookwise-Harvest/1.0)".to_string()
}

fn default_max_category_pages() -> u32 {
    5
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_empty_page_limit() -> u32 {
    2
}

fn default_batch_size() -> usize {
    10
}

fn default_min_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    500
}

fn default_urls_path() -> String {
    "./bibliometro_final_urls.txt".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:3001/api/books/batch".to_string()
}

fn default_database_path() -> String {
    "./books.db".to_string()
}

fn default_secret_env() -> String {
    "API_SECRET".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_category_pages: default_max_category_pages(),
            page_delay_ms: default_page_delay_ms(),
            empty_page_limit: default_empty_page_limit(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            limit: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            urls_path: default_urls_path(),
        }
    }
}

impl Config {
    /// Resolves the shared upload secret from the config file or the environment
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Non-empty secret
    /// * `Err(ConfigError::MissingSecret)` - Neither source provides a secret
    pub fn resolve_secret(&self) -> Result<String, crate::ConfigError> {
        if let Some(secret) = self.sink.api_secret.as_deref() {
            if !secret.trim().is_empty() {
                return Ok(secret.trim().to_string());
            }
        }

        match std::env::var(&self.sink.secret_env) {
            Ok(secret) if !secret.trim().is_empty() => Ok(secret.trim().to_string()),
            _ => Err(crate::ConfigError::MissingSecret {
                env_var: self.sink.secret_env.clone(),
            }),
        }
    }
}
