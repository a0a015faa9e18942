//! Batch assembly and upload
//!
//! Records are merged by id before delivery: the first record for an id keeps
//! its scalar fields and later records only contribute branches it does not
//! already list. A rejected batch is logged in full and the run moves on.

use crate::output::RunStatistics;
use crate::record::BookRecord;
use crate::sink::BookSink;
use std::collections::HashMap;

/// Merges records sharing an id, preserving first-appearance order
///
/// # Arguments
///
/// * `records` - One pending batch, possibly with repeated ids
///
/// # Returns
///
/// One record per id. Scalar fields come from the first record with that id;
/// locations are the union by branch, first occurrence winning.
pub fn merge_batch(records: Vec<BookRecord>) -> Vec<BookRecord> {
    let mut merged: Vec<BookRecord> = Vec::with_capacity(records.len());
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for record in records {
        match index_by_id.get(&record.id) {
            Some(&index) => {
                tracing::debug!("Merging duplicate record {} into batch", record.id);
                merged[index].merge_locations(&record.locations);
            }
            None => {
                index_by_id.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// Merges and delivers one batch, updating run statistics
///
/// A delivery failure never propagates: the full payload is logged at error
/// level so it can be replayed, and the caller continues with the next batch.
///
/// # Returns
///
/// `true` if the sink accepted the batch
pub async fn upload_batch(
    sink: &mut dyn BookSink,
    records: Vec<BookRecord>,
    stats: &mut RunStatistics,
) -> bool {
    if records.is_empty() {
        return true;
    }

    let received = records.len();
    let batch = merge_batch(records);

    tracing::info!(
        "Delivering batch of {} records ({} before merge) to {} sink",
        batch.len(),
        received,
        sink.name()
    );

    match sink.deliver(&batch).await {
        Ok(report) => {
            stats.records_delivered += report.delivered as u64;

            if report.failed > 0 {
                tracing::warn!(
                    "{} sink stored {} records, {} failed",
                    sink.name(),
                    report.delivered,
                    report.failed
                );
                stats.batches_failed += 1;
                return false;
            }

            stats.batches_delivered += 1;
            match report.message {
                Some(message) => tracing::info!("Batch accepted: {}", message),
                None => tracing::info!("Batch accepted ({} records)", report.delivered),
            }
            true
        }
        Err(e) => {
            stats.batches_failed += 1;
            let payload = serde_json::to_string_pretty(&batch)
                .unwrap_or_else(|err| format!("<unserializable payload: {}>", err));
            tracing::error!(
                "{} sink rejected batch of {} records: {}\nPayload:\n{}",
                sink.name(),
                batch.len(),
                e,
                payload
            );
            false
        }
    }
}
