//! Run statistics for crawl and extraction passes
//!
//! Both passes accumulate counters while they run and hand them back to the
//! caller, which prints them once the pass is over.

use crate::state::RejectReason;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

/// Counters for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Pages written to the object store
    pub pages_captured: u64,

    /// Links found on parsed pages, before policy evaluation
    pub links_discovered: u64,

    /// Rejections keyed by reason label
    pub rejected: BTreeMap<&'static str, u64>,

    /// Domains a request was sent to
    pub domains: HashSet<String>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_captured: 0,
            links_discovered: 0,
            rejected: BTreeMap::new(),
            domains: HashSet::new(),
        }
    }

    pub fn record_rejection(&mut self, reason: &RejectReason) {
        *self.rejected.entry(reason.label()).or_insert(0) += 1;
    }

    /// Rejections for a given reason label
    pub fn rejected_for(&self, label: &str) -> u64 {
        self.rejected.get(label).copied().unwrap_or(0)
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one extraction batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Keys returned by the listing
    pub keys_listed: u64,

    /// Keys skipped by the invalid-page filter
    pub skipped_invalid: u64,

    pub inserted: u64,
    pub replaced: u64,

    /// Keys that failed to read, decode or upsert
    pub failed: u64,

    /// Records removed by a full reload
    pub dropped: u64,
}

impl ExtractionStats {
    pub fn upserted(&self) -> u64 {
        self.inserted + self.replaced
    }
}

/// Prints crawl statistics to stdout
pub fn print_crawl_stats(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages captured: {}", stats.pages_captured);
    println!("  Links discovered: {}", stats.links_discovered);
    println!("  Domains contacted: {}", stats.domains.len());
    if let Some(secs) = stats.duration_seconds() {
        println!("  Duration: {}s", secs);
    }
    println!();

    if !stats.rejected.is_empty() {
        println!("Rejected ({}):", stats.total_rejected());
        let mut counts: Vec<_> = stats.rejected.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in counts {
            println!("  {}: {}", reason, count);
        }
        println!();
    }
}

/// Prints extraction statistics to stdout
pub fn print_extraction_stats(company: &str, stats: &ExtractionStats) {
    println!("=== Extraction Statistics ({}) ===\n", company);

    if stats.dropped > 0 {
        println!("  Records dropped (full reload): {}", stats.dropped);
    }
    println!("  Captures listed: {}", stats.keys_listed);
    println!("  Skipped (invalid pages): {}", stats.skipped_invalid);
    println!(
        "  Records upserted: {} ({} new, {} replaced)",
        stats.upserted(),
        stats.inserted,
        stats.replaced
    );
    println!("  Failed: {}", stats.failed);
}
