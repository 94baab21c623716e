//! SQLite document store
//!
//! This module provides the SQLite-backed implementation of the
//! `DocumentStore` trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    DocumentFilter, DocumentStore, StorageError, StorageResult, UpsertOutcome,
};
use crate::storage::NormalizedRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed handle to a single document collection
pub struct SqliteDocumentStore {
    conn: Connection,
    collection: String,
}

impl SqliteDocumentStore {
    /// Opens (creating if needed) the database at `path`, bound to `collection`
    pub fn open(path: &Path, collection: &str) -> StorageResult<Self> {
        if path.as_os_str().is_empty() {
            return Err(StorageError::Config(
                "document store path is empty".to_string(),
            ));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        tracing::debug!(
            "Opened document store {} (collection {})",
            path.display(),
            collection
        );

        Ok(Self {
            conn,
            collection: collection.to_string(),
        })
    }

    /// Creates an in-memory database bound to `collection`
    pub fn open_in_memory(collection: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            collection: collection.to_string(),
        })
    }

    /// Closes the connection, surfacing any error SQLite reports on close
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad updated_at '{}': {}", raw, e)))
}

impl DocumentStore for SqliteDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn upsert(
        &mut self,
        filter: &DocumentFilter,
        record: &NormalizedRecord,
    ) -> StorageResult<UpsertOutcome> {
        if filter.url != record.url {
            return Err(StorageError::InvalidFilter {
                filter: filter.url.clone(),
                record: record.url.clone(),
            });
        }

        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM documents WHERE collection = ?1 AND url = ?2",
                params![self.collection, filter.url],
                |row| row.get(0),
            )
            .optional()?;

        tx.execute(
            "INSERT INTO documents (collection, url, title, description, texts, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(collection, url) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                texts = excluded.texts,
                updated_at = excluded.updated_at",
            params![
                self.collection,
                record.url,
                record.title,
                record.description,
                record.texts,
                record.updated_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;

        Ok(if existing.is_some() {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn drop_collection(&mut self) -> StorageResult<u64> {
        let removed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![self.collection],
        )?;
        tracing::info!(
            "Dropped collection {} ({} records)",
            self.collection,
            removed
        );
        Ok(removed as u64)
    }

    fn find_by_url(&self, url: &str) -> StorageResult<Option<NormalizedRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT url, title, description, texts, updated_at
                 FROM documents WHERE collection = ?1 AND url = ?2",
                params![self.collection, url],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((url, title, description, texts, updated_at)) => Ok(Some(NormalizedRecord {
                url,
                title,
                description,
                texts,
                updated_at: parse_timestamp(&updated_at)?,
            })),
            None => Ok(None),
        }
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
