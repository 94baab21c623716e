//! Batch extraction driver
//!
//! Lists every Page Capture of a company, extracts each one and upserts
//! the resulting record by url. One bad capture never stops the batch.

use super::{extract_record, ExtractionRules};
use crate::output::ExtractionStats;
use crate::storage::{
    get_json, DocumentFilter, DocumentStore, ObjectStore, PageCapture, StorageResult,
    UpsertOutcome,
};
use crate::url::site_prefix;

/// Returns true if `key` contains any of the invalid-page substrings
pub fn is_invalid_page(key: &str, invalid_pages: &[String]) -> bool {
    invalid_pages
        .iter()
        .any(|substring| key.contains(substring.as_str()))
}

/// Extraction pass over one company's captures
///
/// Store handles are injected by the caller, which owns their lifetime.
pub struct Extractor<'a> {
    objects: &'a dyn ObjectStore,
    documents: &'a mut dyn DocumentStore,
    rules: ExtractionRules,
    company: String,
    invalid_pages: Vec<String>,
}

impl<'a> Extractor<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        documents: &'a mut dyn DocumentStore,
        rules: ExtractionRules,
        company: &str,
        invalid_pages: Vec<String>,
    ) -> Self {
        Self {
            objects,
            documents,
            rules,
            company: company.to_string(),
            invalid_pages,
        }
    }

    /// Runs the batch
    ///
    /// With `full_reload`, the collection is dropped before anything else.
    /// Only failures to list or to drop are returned as errors; per-key
    /// failures are logged and counted.
    pub fn run(&mut self, full_reload: bool) -> StorageResult<ExtractionStats> {
        let mut stats = ExtractionStats::default();

        if full_reload {
            stats.dropped = self.documents.drop_collection()?;
            tracing::info!("Dropped collection: {}", self.company);
        }

        let prefix = format!("{}/", site_prefix(&self.company));
        let Some(keys) = self.objects.list(&prefix)? else {
            tracing::info!("No captures found under {}", prefix);
            return Ok(stats);
        };

        stats.keys_listed = keys.len() as u64;
        tracing::info!("Number of captures found: {}", keys.len());

        for key in &keys {
            if is_invalid_page(key, &self.invalid_pages) {
                tracing::debug!("Skipping invalid page: {}", key);
                stats.skipped_invalid += 1;
                continue;
            }

            match self.process_key(key) {
                Ok(UpsertOutcome::Inserted) => stats.inserted += 1,
                Ok(UpsertOutcome::Replaced) => stats.replaced += 1,
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Capture vanished before read: {}", key);
                    stats.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to process {}: {}", key, e);
                    stats.failed += 1;
                }
            }
        }

        tracing::info!(
            "Extraction finished for {}: {} upserted, {} skipped, {} failed",
            self.company,
            stats.upserted(),
            stats.skipped_invalid,
            stats.failed
        );

        Ok(stats)
    }

    fn process_key(&mut self, key: &str) -> StorageResult<UpsertOutcome> {
        tracing::debug!("Processing capture: {}", key);

        let capture: PageCapture = get_json(self.objects, key)?;
        let record = extract_record(&capture.content, &capture.url, &self.rules);

        self.documents
            .upsert(&DocumentFilter::for_record(&record), &record)
    }
}
