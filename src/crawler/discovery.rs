//! URL discovery
//!
//! Two strategies feed one result set: sitemap ingestion and a paginated crawl
//! of the site's category listings. Neither strategy knows how many pages a
//! category has, so pagination stops on evidence instead: a run of listing
//! pages that add nothing new, a hard page ceiling, or a failed fetch.

use crate::config::{Config, DiscoveryConfig};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult, RetryPolicy};
use crate::crawler::parser::extract_detail_links;
use crate::crawler::sitemap::parse_sitemap_locs;
use crate::output::DiscoveryStatistics;
use crate::record::SiteProfile;
use crate::url::{canonicalize_absolute, write_corpus};
use crate::HarvestError;
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Why pagination of a category ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Too many consecutive pages contributed no new URL
    EmptyStreak,

    /// The configured page ceiling was reached
    PageCeiling,

    /// A listing page answered non-200 or could not be fetched
    FetchFailed,

    /// The site has no further listing page for this category
    NoMorePages,
}

/// Result of walking one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub category: String,
    pub pages_fetched: u32,
    pub urls_added: u64,
    pub stop_reason: StopReason,
}

/// Accumulates detail URLs for one site
pub struct Discoverer {
    client: Client,
    profile: SiteProfile,
    settings: DiscoveryConfig,
    policy: RetryPolicy,
    urls: BTreeSet<String>,
    stats: DiscoveryStatistics,
    requests_made: u64,
}

impl Discoverer {
    /// Creates a discoverer with an empty result set
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client scoped to this run
    /// * `profile` - The site being harvested
    /// * `settings` - Page ceiling, politeness delay and empty-page limit
    /// * `policy` - Retry policy for sitemap and listing fetches
    pub fn new(
        client: Client,
        profile: SiteProfile,
        settings: DiscoveryConfig,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            profile,
            settings,
            policy,
            urls: BTreeSet::new(),
            stats: DiscoveryStatistics::default(),
            requests_made: 0,
        }
    }

    /// URLs discovered so far, sorted
    pub fn urls(&self) -> &BTreeSet<String> {
        &self.urls
    }

    pub fn statistics(&self) -> &DiscoveryStatistics {
        &self.stats
    }

    /// Adds unseen links to the result set
    ///
    /// # Returns
    ///
    /// The number of links that were not already known
    pub fn record_page_links<I>(&mut self, links: I) -> u64
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for link in links {
            if self.urls.insert(link) {
                added += 1;
            }
        }
        added
    }

    /// Runs both strategies and returns the union
    pub async fn run(mut self) -> (BTreeSet<String>, DiscoveryStatistics) {
        self.collect_from_sitemaps().await;
        self.crawl_categories().await;

        self.stats.total_urls = self.urls.len() as u64;
        (self.urls, self.stats)
    }

    /// Collects detail URLs from every candidate sitemap
    ///
    /// A sitemap that cannot be fetched, answers non-200, or does not parse is
    /// skipped; the next candidate is still tried.
    ///
    /// # Returns
    ///
    /// The number of new URLs contributed by sitemaps
    pub async fn collect_from_sitemaps(&mut self) -> u64 {
        let mut added_total = 0;

        for sitemap_url in self.profile.sitemap_urls() {
            self.pace().await;
            self.stats.sitemaps_tried += 1;

            let body = match fetch_url(&self.client, sitemap_url.as_str(), &self.policy).await {
                FetchResult::Success { body, .. } => body,
                FetchResult::HttpError { status_code } => {
                    tracing::warn!("Sitemap {} returned HTTP {}, skipping", sitemap_url, status_code);
                    continue;
                }
                FetchResult::NetworkError { error, .. } => {
                    tracing::warn!("Sitemap {} unreachable ({}), skipping", sitemap_url, error);
                    continue;
                }
            };

            let locs = match parse_sitemap_locs(&body) {
                Ok(locs) => locs,
                Err(e) => {
                    tracing::warn!("Sitemap {} is not valid XML ({}), skipping", sitemap_url, e);
                    continue;
                }
            };
            self.stats.sitemaps_parsed += 1;

            let detail_urls: Vec<String> = locs
                .iter()
                .filter_map(|loc| canonicalize_absolute(loc).ok())
                .filter(|url| self.profile.is_detail_url(url))
                .map(String::from)
                .collect();

            let added = self.record_page_links(detail_urls);
            tracing::info!(
                "Sitemap {}: {} locations, {} new detail URLs",
                sitemap_url,
                locs.len(),
                added
            );
            added_total += added;
        }

        self.stats.sitemap_urls += added_total;
        added_total
    }

    /// Walks every category of the site profile in order
    pub async fn crawl_categories(&mut self) -> Vec<CategoryOutcome> {
        let mut outcomes = Vec::with_capacity(self.profile.categories.len());

        for category in self.profile.categories {
            let outcome = self.crawl_category(category).await;
            tracing::info!(
                "Category {:?}: {} pages, {} new URLs, stopped on {:?}",
                outcome.category,
                outcome.pages_fetched,
                outcome.urls_added,
                outcome.stop_reason
            );
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Paginates one category from page 1 until a stop condition holds
    ///
    /// # Stop Conditions
    ///
    /// | Condition | Reason |
    /// |-----------|--------|
    /// | `empty-page-limit` consecutive pages added nothing new | EmptyStreak |
    /// | Next page would exceed `max-category-pages` | PageCeiling |
    /// | Listing page non-200 or unreachable | FetchFailed |
    /// | Site has no listing page with that number | NoMorePages |
    pub async fn crawl_category(&mut self, category: &str) -> CategoryOutcome {
        let mut outcome = CategoryOutcome {
            category: category.to_string(),
            pages_fetched: 0,
            urls_added: 0,
            stop_reason: StopReason::PageCeiling,
        };
        let mut empty_streak = 0u32;
        let mut page = 1u32;

        self.stats.categories_crawled += 1;

        loop {
            if page > self.settings.max_category_pages {
                outcome.stop_reason = StopReason::PageCeiling;
                break;
            }

            let Some(page_url) = self.profile.category_page_url(category, page) else {
                outcome.stop_reason = StopReason::NoMorePages;
                break;
            };

            self.pace().await;

            let (final_url, body) =
                match fetch_url(&self.client, page_url.as_str(), &self.policy).await {
                    FetchResult::Success {
                        final_url, body, ..
                    } => (final_url, body),
                    FetchResult::HttpError { status_code } => {
                        tracing::warn!(
                            "Listing {} returned HTTP {}, ending category",
                            page_url,
                            status_code
                        );
                        outcome.stop_reason = StopReason::FetchFailed;
                        break;
                    }
                    FetchResult::NetworkError { error, .. } => {
                        tracing::warn!("Listing {} unreachable ({}), ending category", page_url, error);
                        outcome.stop_reason = StopReason::FetchFailed;
                        break;
                    }
                };

            outcome.pages_fetched += 1;
            self.stats.category_pages_fetched += 1;

            let base = Url::parse(&final_url).unwrap_or(page_url);
            let links = extract_detail_links(&body, &base, &self.profile);
            let added = self.record_page_links(links);

            outcome.urls_added += added;
            self.stats.category_urls += added;

            if added == 0 {
                empty_streak += 1;
                tracing::debug!(
                    "{} page {} added nothing new ({} in a row)",
                    category,
                    page,
                    empty_streak
                );
                if empty_streak >= self.settings.empty_page_limit {
                    outcome.stop_reason = StopReason::EmptyStreak;
                    break;
                }
            } else {
                empty_streak = 0;
                tracing::debug!("{} page {} added {} URLs", category, page, added);
            }

            page += 1;
        }

        outcome
    }

    /// Sleeps the politeness delay before every request but the first
    async fn pace(&mut self) {
        if self.requests_made > 0 && self.settings.page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.settings.page_delay_ms)).await;
        }
        self.requests_made += 1;
    }
}

/// Discovers detail URLs for the configured site and persists the corpus
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(DiscoveryStatistics)` - Corpus written to `output.urls-path`
/// * `Err(HarvestError)` - Invalid site URL, client construction or corpus write failed
///
/// # Example
///
/// ```no_run
/// use bookwise_harvest::config::load_config;
/// use bookwise_harvest::crawler::run_discovery;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let stats = run_discovery(&config).await?;
/// println!("{} URLs", stats.total_urls);
/// # Ok(())
/// # }
/// ```
pub async fn run_discovery(config: &Config) -> Result<DiscoveryStatistics, HarvestError> {
    let profile = SiteProfile::for_source(config.site.source, config.site.base_url.as_deref())?;
    let client = build_http_client(&config.http)?;
    let policy = RetryPolicy::from_config(&config.http);

    tracing::info!(
        "Starting discovery for {} at {}",
        profile.source,
        profile.base_url
    );

    let discoverer = Discoverer::new(client, profile, config.discovery.clone(), policy);
    let (urls, mut stats) = discoverer.run().await;

    let corpus_path = Path::new(&config.output.urls_path);
    write_corpus(corpus_path, &urls)?;
    stats.corpus_path = corpus_path.to_path_buf();

    tracing::info!(
        "Discovery complete: {} URLs written to {}",
        urls.len(),
        corpus_path.display()
    );

    Ok(stats)
}
