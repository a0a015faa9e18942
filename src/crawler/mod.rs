//! Crawler module for page fetching and the two harvest phases
//!
//! This module contains the network-facing logic, including:
//! - HTTP fetching with bounded retry and backoff
//! - Link extraction from listing pages and `<loc>` extraction from sitemaps
//! - URL discovery (sitemaps plus paginated category crawl)
//! - The detail fetch loop that feeds the delivery sink
//! - `run_harvest`, which checks preconditions and runs the selected phases

mod coordinator;
mod discovery;
mod fetcher;
mod parser;
mod sitemap;

pub use coordinator::{run_extraction, Coordinator};
pub use discovery::{run_discovery, CategoryOutcome, Discoverer, StopReason};
pub use fetcher::{build_http_client, fetch_url, FetchResult, RetryPolicy};
pub use parser::{extract_detail_links, extract_links};
pub use sitemap::{parse_sitemap_locs, SitemapError};

use crate::config::{Config, SinkKind};
use crate::output::{DiscoveryStatistics, RunStatistics};
use crate::HarvestError;
use std::path::Path;

/// Which phases a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestMode {
    /// Discovery, then extraction over the corpus it wrote
    Full,
    DiscoverOnly,
    /// Extraction over an existing corpus
    ExtractOnly,
}

impl HarvestMode {
    pub fn discovers(self) -> bool {
        self != HarvestMode::ExtractOnly
    }

    pub fn extracts(self) -> bool {
        self != HarvestMode::DiscoverOnly
    }
}

/// Statistics of the phases that ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub discovery: Option<DiscoveryStatistics>,
    pub extraction: Option<RunStatistics>,
}

/// Checks the fatal preconditions of `mode` without touching the network
///
/// # Returns
///
/// * `Ok(())` - Every phase of `mode` can start
/// * `Err(HarvestError::Config)` - Extraction needs an upload secret that is not set
/// * `Err(HarvestError::MissingCorpus)` - Extraction alone needs a corpus that does not exist
pub fn check_preconditions(config: &Config, mode: HarvestMode) -> Result<(), HarvestError> {
    if mode.extracts() && config.sink.kind == SinkKind::Http {
        config.resolve_secret()?;
    }

    // A full run writes the corpus before reading it
    if mode == HarvestMode::ExtractOnly {
        let corpus = Path::new(&config.output.urls_path);
        if !corpus.exists() {
            return Err(HarvestError::MissingCorpus {
                path: corpus.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Runs the phases selected by `mode`
///
/// All preconditions are checked before the first request, so a missing
/// secret aborts a full run before discovery starts crawling.
///
/// # Example
///
/// ```no_run
/// use bookwise_harvest::config::load_config;
/// use bookwise_harvest::crawler::{run_harvest, HarvestMode};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(&config, HarvestMode::Full).await?;
/// if let Some(stats) = report.extraction {
///     println!("{} records delivered", stats.records_delivered);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: &Config, mode: HarvestMode) -> Result<HarvestReport, HarvestError> {
    check_preconditions(config, mode)?;

    let mut report = HarvestReport::default();

    if mode.discovers() {
        report.discovery = Some(run_discovery(config).await?);
    }

    if mode.extracts() {
        report.extraction = Some(run_extraction(config).await?);
    }

    Ok(report)
}
