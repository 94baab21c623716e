//! Output module for run summaries
//!
//! This module handles:
//! - Counting what a crawl or extraction pass did
//! - Printing those counts when the pass is over

pub mod stats;

pub use stats::{print_crawl_stats, print_extraction_stats, CrawlStats, ExtractionStats};
