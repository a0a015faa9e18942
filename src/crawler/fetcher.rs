//! HTTP fetcher implementation
//!
//! This module handles all page requests made during discovery and extraction:
//! - Building the HTTP client from the `[http]` configuration
//! - GET requests with a bounded retry-with-backoff policy
//! - Error classification into a `FetchResult` the loops can skip on

use crate::config::HttpConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Status codes treated as transient server-side failures
const RETRYABLE_STATUSES: &[u16] = &[500, 502, 503, 504];

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page (HTTP 200)
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The server answered with anything other than 200
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, unreadable body)
    NetworkError {
        /// Error description
        error: String,
        /// Timeout or connection failure; worth another attempt
        transient: bool,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    /// Returns true if the same request may succeed when retried
    pub fn is_transient(&self) -> bool {
        match self {
            FetchResult::Success { .. } => false,
            FetchResult::HttpError { status_code } => RetryPolicy::is_retryable_status(*status_code),
            FetchResult::NetworkError { transient, .. } => *transient,
        }
    }
}

/// Bounded retry-with-backoff for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later one
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff.saturating_mul(factor)
    }

    /// Returns true if a response with this status should be retried
    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The `[http]` configuration section
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use bookwise_harvest::config::HttpConfig;
/// use bookwise_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with full error handling and retry logic
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Success |
/// | HTTP 500/502/503/504 | Retry up to `max_retries`, exponential backoff |
/// | Other HTTP status | Immediate → HttpError |
/// | Timeout / connection failure | Retry up to `max_retries`, exponential backoff |
/// | Other transport error | Immediate → NetworkError |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `policy` - Retry policy for transient failures
///
/// # Returns
///
/// A FetchResult indicating success or the type of failure
pub async fn fetch_url(client: &Client, url: &str, policy: &RetryPolicy) -> FetchResult {
    let mut attempt = 0u32;

    loop {
        let result = fetch_once(client, url).await;

        if !result.is_transient() || attempt >= policy.max_retries {
            return result;
        }

        attempt += 1;
        let delay = policy.delay_for(attempt);
        tracing::debug!(
            "Retrying {} (attempt {}/{}) in {:?}",
            url,
            attempt,
            policy.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}

/// One GET request, classified
async fn fetch_once(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if status != StatusCode::OK {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: format!("Failed to read body: {}", e),
                    transient: false,
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                format!("Request timeout: {}", e)
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            FetchResult::NetworkError {
                error,
                transient: e.is_timeout() || e.is_connect(),
            }
        }
    }
}
