//! Bookwise-Harvest: catalog and availability harvester for library websites
//!
//! This crate discovers book detail pages on a library site, extracts a canonical
//! record from each page using ordered fallback heuristics, and delivers batches
//! of records to an ingestion sink (HTTP endpoint or SQLite table).

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;
pub mod sink;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Bookwise-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL corpus not found at {}; run discovery first", path.display())]
    MissingCorpus { path: PathBuf },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Upload secret missing: set sink.api-secret or the {env_var} environment variable")]
    MissingSecret { env_var: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Bookwise-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{book_id, BookRecord, Location, SiteProfile, Source};
pub use url::{canonicalize, read_corpus, write_corpus};
