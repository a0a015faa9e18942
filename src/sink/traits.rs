//! Sink traits and error types
//!
//! A sink is the downstream system that durably stores records. The extraction
//! loop only talks to this trait, so the same pipeline feeds either the HTTP
//! ingestion endpoint or a local SQLite table.

use crate::record::BookRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while delivering a batch
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Batch rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Outcome of one accepted delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Records the sink stored
    pub delivered: usize,

    /// Records the sink could not store (the rest of the batch still went in)
    pub failed: usize,

    /// Human-readable message returned by the sink, if any
    pub message: Option<String>,
}

/// Trait for delivery sink implementations
#[async_trait]
pub trait BookSink: Send {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Delivers one merged batch
    ///
    /// # Arguments
    ///
    /// * `records` - Records with unique ids
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - The sink accepted the batch (possibly partially)
    /// * `Err(SinkError)` - The whole batch was rejected or could not be sent
    async fn deliver(&mut self, records: &[BookRecord]) -> SinkResult<DeliveryReport>;
}
