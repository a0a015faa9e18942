//! Output module for run reporting
//!
//! This module handles:
//! - Counting discovery and extraction outcomes
//! - Printing end-of-run summaries

pub mod stats;

pub use stats::{
    print_discovery_statistics, print_run_statistics, DiscoveryStatistics, RunStatistics,
};
