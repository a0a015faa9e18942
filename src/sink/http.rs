//! HTTP ingestion sink
//!
//! Batches are POSTed as a JSON array with the shared secret in the
//! `x-api-secret` header. Transient failures (connection errors and
//! 500/502/503/504) are retried with exponential backoff before the batch is
//! reported as rejected.

use crate::crawler::RetryPolicy;
use crate::record::BookRecord;
use crate::sink::{BookSink, DeliveryReport, SinkError, SinkResult};
use async_trait::async_trait;
use reqwest::Client;

/// Header carrying the shared upload secret
pub const SECRET_HEADER: &str = "x-api-secret";

/// Sink that POSTs batches to the ingestion endpoint
pub struct HttpSink {
    client: Client,
    endpoint: String,
    secret: String,
    policy: RetryPolicy,
}

impl HttpSink {
    /// Creates a sink for `endpoint`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client scoped to this run
    /// * `endpoint` - Full URL of the batch endpoint
    /// * `secret` - Shared secret sent with every request
    /// * `policy` - Retry policy for transient failures
    pub fn new(client: Client, endpoint: &str, secret: &str, policy: RetryPolicy) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            secret: secret.to_string(),
            policy,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One POST attempt
    ///
    /// Returns the status and body on any response, or the transport error.
    async fn post_once(&self, records: &[BookRecord]) -> Result<(u16, String), reqwest::Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(SECRET_HEADER, &self.secret)
            .json(records)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }
}

#[async_trait]
impl BookSink for HttpSink {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn deliver(&mut self, records: &[BookRecord]) -> SinkResult<DeliveryReport> {
        let mut attempt = 0u32;

        loop {
            let reason = match self.post_once(records).await {
                Ok((status, body)) if (200..300).contains(&status) => {
                    return Ok(DeliveryReport {
                        delivered: records.len(),
                        failed: 0,
                        message: response_message(&body),
                    });
                }
                Ok((status, body)) => {
                    if !RetryPolicy::is_retryable_status(status) || attempt >= self.policy.max_retries
                    {
                        return Err(SinkError::Rejected { status, body });
                    }
                    format!("HTTP {}", status)
                }
                Err(e) => {
                    if !(e.is_timeout() || e.is_connect()) || attempt >= self.policy.max_retries {
                        return Err(SinkError::Http(e));
                    }
                    e.to_string()
                }
            };

            attempt += 1;
            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                "Delivery to {} failed ({}), retry {}/{} in {:?}",
                self.endpoint,
                reason,
                attempt,
                self.policy.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Extracts the human-readable message from a success body
///
/// Accepts `{"message": "..."}` or plain text; an empty body yields `None`.
fn response_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| Some(body.to_string())),
        Err(_) => Some(body.to_string()),
    }
}
