//! Per-run statistics
//!
//! Discovery and extraction each keep a small set of counters while they run.
//! The counters are returned from the run entry points and printed at the end.

use std::path::PathBuf;

/// Counters for one discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryStatistics {
    /// Sitemap endpoints requested
    pub sitemaps_tried: u64,

    /// Sitemaps that answered 200 and parsed as XML
    pub sitemaps_parsed: u64,

    /// New detail URLs contributed by sitemaps
    pub sitemap_urls: u64,

    /// Categories whose pagination was walked
    pub categories_crawled: u64,

    /// Listing pages fetched successfully
    pub category_pages_fetched: u64,

    /// New detail URLs contributed by the category crawl
    pub category_urls: u64,

    /// Size of the persisted corpus
    pub total_urls: u64,

    /// Where the corpus was written
    pub corpus_path: PathBuf,
}

/// Counters for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// URLs read from the corpus (after the optional limit)
    pub urls_loaded: u64,

    /// Detail pages fetched with HTTP 200
    pub pages_fetched: u64,

    /// Records assembled from fetched pages
    pub records_extracted: u64,

    /// URLs skipped because the server answered with a non-200 status
    pub skipped_http: u64,

    /// URLs skipped because of a transport failure
    pub skipped_network: u64,

    /// Pages that yielded no title
    pub skipped_no_title: u64,

    /// Batches accepted by the sink
    pub batches_delivered: u64,

    /// Batches the sink rejected or failed to store
    pub batches_failed: u64,

    /// Records accepted by the sink (after within-batch merging)
    pub records_delivered: u64,
}

impl RunStatistics {
    /// URLs that produced no record, for any reason
    pub fn total_skipped(&self) -> u64 {
        self.skipped_http + self.skipped_network + self.skipped_no_title
    }
}

/// Prints discovery statistics to stdout in a formatted manner
pub fn print_discovery_statistics(stats: &DiscoveryStatistics) {
    println!("=== Discovery Statistics ===\n");

    println!("Sitemaps:");
    println!("  Requested: {}", stats.sitemaps_tried);
    println!("  Parsed: {}", stats.sitemaps_parsed);
    println!("  URLs found: {}", stats.sitemap_urls);
    println!();

    println!("Category crawl:");
    println!("  Categories: {}", stats.categories_crawled);
    println!("  Pages fetched: {}", stats.category_pages_fetched);
    println!("  URLs found: {}", stats.category_urls);
    println!();

    println!(
        "Corpus: {} URLs written to {}",
        stats.total_urls,
        stats.corpus_path.display()
    );
}

/// Prints extraction statistics to stdout in a formatted manner
pub fn print_run_statistics(stats: &RunStatistics) {
    println!("=== Extraction Statistics ===\n");

    println!("Pages:");
    println!("  URLs loaded: {}", stats.urls_loaded);
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Records extracted: {}", stats.records_extracted);
    println!();

    if stats.total_skipped() > 0 {
        println!("Skipped:");
        println!("  HTTP status: {}", stats.skipped_http);
        println!("  Network: {}", stats.skipped_network);
        println!("  No title: {}", stats.skipped_no_title);
        println!();
    }

    println!("Delivery:");
    println!("  Batches delivered: {}", stats.batches_delivered);
    println!("  Batches failed: {}", stats.batches_failed);
    println!("  Records delivered: {}", stats.records_delivered);
    println!();

    let success_rate = if stats.urls_loaded > 0 {
        (stats.records_extracted as f64 / stats.urls_loaded as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} URLs produced a record)",
        success_rate, stats.records_extracted, stats.urls_loaded
    );
}
