//! Extraction coordinator - the detail fetch loop
//!
//! This module walks the URL corpus sequentially:
//! - Fetching each detail page (one request in flight at a time)
//! - Extracting a record from every page that answers 200
//! - Accumulating records into batches and handing full batches to the sink
//! - Sleeping a randomized courtesy delay between fetches

use crate::config::{Config, ExtractionConfig};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult, RetryPolicy};
use crate::extract::extract_record;
use crate::output::RunStatistics;
use crate::record::{BookRecord, SiteProfile};
use crate::sink::{open_sink, upload_batch, BookSink};
use crate::url::read_corpus;
use crate::HarvestError;
use rand::Rng;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main extraction coordinator structure
pub struct Coordinator {
    client: Client,
    profile: SiteProfile,
    settings: ExtractionConfig,
    policy: RetryPolicy,
    sink: Box<dyn BookSink>,
    pending: Vec<BookRecord>,
    stats: RunStatistics,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client scoped to this run
    /// * `profile` - The site the corpus belongs to
    /// * `settings` - Batch size and courtesy delay window
    /// * `policy` - Retry policy for detail page fetches
    /// * `sink` - Where batches are delivered
    pub fn new(
        client: Client,
        profile: SiteProfile,
        settings: ExtractionConfig,
        policy: RetryPolicy,
        sink: Box<dyn BookSink>,
    ) -> Self {
        let batch_size = settings.batch_size.max(1);
        Self {
            client,
            profile,
            settings,
            policy,
            sink,
            pending: Vec::with_capacity(batch_size),
            stats: RunStatistics::default(),
        }
    }

    /// Runs the fetch loop over `urls` and flushes the final partial batch
    ///
    /// A failing URL or a rejected batch never stops the loop; both are logged
    /// and counted in the returned statistics.
    pub async fn run(mut self, urls: &[String]) -> RunStatistics {
        let total = urls.len();
        let start_time = std::time::Instant::now();
        self.stats.urls_loaded = total as u64;

        tracing::info!("Starting extraction of {} URLs", total);

        for (index, url) in urls.iter().enumerate() {
            if index > 0 {
                self.courtesy_delay().await;
            }

            self.process_url(index + 1, total, url).await;

            if self.pending.len() >= self.settings.batch_size.max(1) {
                self.flush().await;
            }
        }

        self.flush().await;

        tracing::info!(
            "Extraction completed: {} records from {} URLs in {:?}",
            self.stats.records_extracted,
            total,
            start_time.elapsed()
        );

        self.stats
    }

    /// Fetches one detail page and appends its record to the pending batch
    async fn process_url(&mut self, position: usize, total: usize, url_str: &str) {
        let url = match Url::parse(url_str) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("[{}/{}] Skipping malformed URL {}: {}", position, total, url_str, e);
                self.stats.skipped_network += 1;
                return;
            }
        };

        let body = match fetch_url(&self.client, url.as_str(), &self.policy).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::HttpError { status_code } => {
                tracing::warn!("[{}/{}] HTTP {} for {}, skipping", position, total, status_code, url);
                self.stats.skipped_http += 1;
                return;
            }
            FetchResult::NetworkError { error, .. } => {
                tracing::warn!("[{}/{}] Failed to fetch {}: {}", position, total, url, error);
                self.stats.skipped_network += 1;
                return;
            }
        };
        self.stats.pages_fetched += 1;

        match extract_record(&body, &url, &self.profile) {
            Some(record) => {
                tracing::info!(
                    "[{}/{}] {} by {} ({} branches)",
                    position,
                    total,
                    record.title,
                    record.author,
                    record.locations.len()
                );
                self.stats.records_extracted += 1;
                self.pending.push(record);
            }
            None => {
                tracing::warn!("[{}/{}] No title found on {}, skipping", position, total, url);
                self.stats.skipped_no_title += 1;
            }
        }
    }

    /// Hands the pending batch to the sink
    async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let batch = std::mem::take(&mut self.pending);
        upload_batch(self.sink.as_mut(), batch, &mut self.stats).await;
    }

    /// Sleeps a random duration within the configured window
    async fn courtesy_delay(&self) {
        let min = self.settings.min_delay_ms;
        let max = self.settings.max_delay_ms.max(min);
        let delay = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };

        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

/// Runs the extraction phase over the persisted URL corpus
///
/// Both fatal preconditions are checked before any request is made: the sink
/// must be openable (for the HTTP sink this includes the shared secret) and
/// the corpus file must exist.
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(RunStatistics)` - The loop completed (possibly with skipped URLs or failed batches)
/// * `Err(HarvestError)` - A precondition failed
///
/// # Example
///
/// ```no_run
/// use bookwise_harvest::config::load_config;
/// use bookwise_harvest::crawler::run_extraction;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let stats = run_extraction(&config).await?;
/// println!("{} records delivered", stats.records_delivered);
/// # Ok(())
/// # }
/// ```
pub async fn run_extraction(config: &Config) -> Result<RunStatistics, HarvestError> {
    let sink = open_sink(config)?;

    let mut urls = read_corpus(Path::new(&config.output.urls_path))?;
    if config.extraction.limit > 0 && urls.len() > config.extraction.limit {
        tracing::info!(
            "Limiting extraction to the first {} of {} URLs",
            config.extraction.limit,
            urls.len()
        );
        urls.truncate(config.extraction.limit);
    }

    let profile = SiteProfile::for_source(config.site.source, config.site.base_url.as_deref())?;
    let client = build_http_client(&config.http)?;
    let policy = RetryPolicy::from_config(&config.http);

    let coordinator = Coordinator::new(client, profile, config.extraction.clone(), policy, sink);
    Ok(coordinator.run(&urls).await)
}
