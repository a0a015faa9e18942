//! Bookwise-Harvest main entry point
//!
//! This is the command-line interface for the library catalog harvester.

use anyhow::Context;
use bookwise_harvest::config::{load_config_with_hash, Config, SinkKind};
use bookwise_harvest::crawler::{run_harvest, HarvestMode};
use bookwise_harvest::output::{print_discovery_statistics, print_run_statistics};
use bookwise_harvest::record::SiteProfile;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bookwise-Harvest: catalog and availability harvester for library websites
///
/// Discovers book detail pages, extracts a canonical record from each one and
/// delivers the records in batches to an HTTP ingestion endpoint or SQLite.
/// With no mode flag, discovery runs first and extraction reads its output.
#[derive(Parser, Debug)]
#[command(name = "bookwise-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Library catalog and availability harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only discover URLs and write the corpus file
    #[arg(long, conflicts_with_all = ["extract", "dry_run"])]
    discover: bool,

    /// Only extract records from an existing corpus file
    #[arg(long, conflicts_with_all = ["discover", "dry_run"])]
    extract: bool,

    /// Validate config and show the resolved site profile without any requests
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let mode = if cli.discover {
        HarvestMode::DiscoverOnly
    } else if cli.extract {
        HarvestMode::ExtractOnly
    } else {
        HarvestMode::Full
    };

    let report = run_harvest(&config, mode)
        .await
        .with_context(|| format!("Harvest failed ({:?})", mode))?;

    if !cli.quiet {
        if let Some(stats) = &report.discovery {
            print_discovery_statistics(stats);
        }
        if let Some(stats) = &report.extraction {
            print_run_statistics(stats);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookwise_harvest=info,warn"),
            1 => EnvFilter::new("bookwise_harvest=debug,info"),
            2 => EnvFilter::new("bookwise_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let profile = SiteProfile::for_source(config.site.source, config.site.base_url.as_deref())
        .context("Invalid site base URL")?;

    println!("=== Bookwise-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Source: {}", profile.source);
    println!("  Base URL: {}", profile.base_url);
    println!("  Detail paths: {}", profile.detail_markers.join(", "));

    println!("\nSitemaps ({}):", profile.sitemap_paths.len());
    for url in profile.sitemap_urls() {
        println!("  - {}", url);
    }

    println!("\nCategories ({}):", profile.categories.len());
    for category in profile.categories {
        if let Some(url) = profile.category_page_url(category, 1) {
            println!("  - {} ({})", category, url);
        }
    }

    println!("\nDiscovery:");
    println!("  Max pages per category: {}", config.discovery.max_category_pages);
    println!("  Page delay: {}ms", config.discovery.page_delay_ms);
    println!("  Empty page limit: {}", config.discovery.empty_page_limit);

    println!("\nExtraction:");
    println!("  Batch size: {}", config.extraction.batch_size);
    println!(
        "  Delay window: {}-{}ms",
        config.extraction.min_delay_ms, config.extraction.max_delay_ms
    );
    if config.extraction.limit > 0 {
        println!("  Limit: first {} URLs", config.extraction.limit);
    }

    println!("\nOutput:");
    println!("  URL corpus: {}", config.output.urls_path);

    println!("\nSink:");
    match config.sink.kind {
        SinkKind::Http => {
            println!("  HTTP endpoint: {}", config.sink.endpoint);
            let secret_state = match config.resolve_secret() {
                Ok(_) => "configured".to_string(),
                Err(e) => format!("MISSING ({})", e),
            };
            println!("  Upload secret: {}", secret_state);
        }
        SinkKind::Sqlite => println!("  SQLite database: {}", config.sink.database_path),
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}
