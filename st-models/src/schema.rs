//! SQLite schema for the local document store.
//!
//! Every document lives in one table keyed by its collection path and id.
//! Subcollections are just longer collection paths
//! (`users/u1/contacts`), mirroring the managed store's addressing.

use rusqlite::Connection;
use st_core::error::{StError, StResult};
use tracing::debug;

/// Current schema version written on creation.
pub const SCHEMA_VERSION: i32 = 1;

/// Create all tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> StResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| StError::Store(format!("failed to create schema: {e}")))?;

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| StError::Store(e.to_string()))?;
    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [SCHEMA_VERSION])
            .map_err(|e| StError::Store(e.to_string()))?;
    }

    debug!("document schema verified (version {SCHEMA_VERSION})");
    Ok(())
}

/// Drop all tables (used for reset).
pub fn drop_tables(conn: &Connection) -> StResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS documents;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| StError::Store(format!("failed to drop tables: {e}")))?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    id          TEXT NOT NULL,
    data        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
"#;
