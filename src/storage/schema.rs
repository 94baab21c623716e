//! Document store schema
//!
//! All collections share one `documents` table; the `collection` column
//! namespaces them, so dropping a collection is a scoped delete.

/// SQL schema for the document store
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT,
    description TEXT,
    texts TEXT,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, url)
);

CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(collection, updated_at);
"#;

/// Initializes the database schema
///
/// Safe to run against an existing database.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
