//! Delivery sinks for harvested records
//!
//! This module handles:
//! - Merging records that share an id within one batch
//! - Delivering batches to the HTTP ingestion endpoint
//! - Upserting batches into a local SQLite table

mod batch;
mod http;
mod schema;
mod sqlite;
mod traits;

pub use batch::{merge_batch, upload_batch};
pub use http::{HttpSink, SECRET_HEADER};
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteSink;
pub use traits::{BookSink, DeliveryReport, SinkError, SinkResult};

use crate::config::{Config, SinkKind};
use crate::crawler::{build_http_client, RetryPolicy};
use crate::HarvestError;
use std::path::Path;

/// Opens the sink selected by `sink.kind`
///
/// For the HTTP sink the shared secret is resolved here; a missing secret is
/// returned as an error before any request is made.
///
/// # Returns
///
/// * `Ok(Box<dyn BookSink>)` - Ready-to-use sink
/// * `Err(HarvestError)` - Missing secret, client construction or database open failed
pub fn open_sink(config: &Config) -> Result<Box<dyn BookSink>, HarvestError> {
    match config.sink.kind {
        SinkKind::Http => {
            let secret = config.resolve_secret()?;
            let client = build_http_client(&config.http)?;
            let policy = RetryPolicy::from_config(&config.http);
            tracing::info!("Delivering to HTTP sink at {}", config.sink.endpoint);
            Ok(Box::new(HttpSink::new(
                client,
                &config.sink.endpoint,
                &secret,
                policy,
            )))
        }
        SinkKind::Sqlite => {
            let path = Path::new(&config.sink.database_path);
            tracing::info!("Delivering to SQLite sink at {}", path.display());
            Ok(Box::new(SqliteSink::new(path)?))
        }
    }
}
