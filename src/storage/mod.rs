//! Storage module for page captures and normalized records
//!
//! This module holds the two store clients the pipeline talks to:
//! - the object store (bucket of JSON objects) that receives one Page
//!   Capture per fetched URL
//! - the document store that receives one Normalized Record per URL

mod object;
mod schema;
mod sqlite;
mod traits;

pub use object::{FsObjectStore, MemoryObjectStore};
pub use sqlite::SqliteDocumentStore;
pub use traits::{
    get_json, put_json, DocumentFilter, DocumentStore, ObjectStore, StorageError, StorageResult,
    UpsertOutcome,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw snapshot of one fetched page, stored verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCapture {
    pub url: String,
    pub content: String,
}

/// Cleaned, field-extracted representation of a page, keyed by `url`
///
/// Readers must tolerate absent `title`, `description` and `texts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub texts: Option<String>,
    pub updated_at: DateTime<Utc>,
}
