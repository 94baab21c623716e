//! Storage traits and error types
//!
//! This module defines the interfaces the pipeline calls on its two stores:
//! a flat key/value object store holding Page Captures, and a document
//! store holding Normalized Records with upsert-by-url semantics.

use crate::storage::NormalizedRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Filter {filter} does not match record {record}")]
    InvalidFilter { filter: String, record: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage misconfigured: {0}")]
    Config(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Returns true when the requested object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Flat key/value store for JSON objects (a bucket namespace)
///
/// Keys are `/`-separated. Implementations must make `put` atomic from a
/// reader's point of view: a concurrent `get` sees the old or the new
/// value, never a partial one.
pub trait ObjectStore: Send + Sync {
    /// Serializes `value` and stores it under `key`, replacing any previous value
    fn put(&self, key: &str, value: &Value) -> StorageResult<()>;

    /// Lists all keys starting with `prefix`, sorted
    ///
    /// Returns `None` (not an error) when nothing matches.
    fn list(&self, prefix: &str) -> StorageResult<Option<Vec<String>>>;

    /// Reads the JSON value stored under `key`
    ///
    /// Fails with `StorageError::NotFound` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Value>;
}

/// Stores any serializable value under `key`
pub fn put_json<T: Serialize + ?Sized>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let value = serde_json::to_value(value)?;
    store.put(key, &value)
}

/// Reads and decodes the value stored under `key`
pub fn get_json<T: DeserializeOwned>(store: &dyn ObjectStore, key: &str) -> StorageResult<T> {
    let value = store.get(key)?;
    Ok(serde_json::from_value(value)?)
}

/// Match filter for document upserts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
    pub url: String,
}

impl DocumentFilter {
    pub fn by_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    /// Filter matching the record's own natural key
    pub fn for_record(record: &NormalizedRecord) -> Self {
        Self::by_url(&record.url)
    }
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Document store holding one collection of Normalized Records
///
/// A collection holds at most one record per url.
pub trait DocumentStore {
    /// Name of the collection this handle is bound to
    fn collection(&self) -> &str;

    /// Replaces the record matching `filter`, or inserts it if none matches
    ///
    /// `filter.url` must equal `record.url`.
    fn upsert(
        &mut self,
        filter: &DocumentFilter,
        record: &NormalizedRecord,
    ) -> StorageResult<UpsertOutcome>;

    /// Removes every record in the collection; returns how many were removed
    fn drop_collection(&mut self) -> StorageResult<u64>;

    /// Looks up the record for a url
    fn find_by_url(&self, url: &str) -> StorageResult<Option<NormalizedRecord>>;

    /// Counts records in the collection
    fn count(&self) -> StorageResult<u64>;
}
