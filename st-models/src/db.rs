//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite in WAL mode with r2d2 connection pooling.
//! Runs integrity checks on startup and creates the document table.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, warn, error};

use st_core::error::{StError, StResult};
use st_core::config::StoreConfig;

use crate::schema;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// This:
    /// 1. Creates the database file and parent directories if needed
    /// 2. Enables WAL mode for concurrent read/write
    /// 3. Sets up connection pooling
    /// 4. Runs integrity checks if configured
    /// 5. Creates the schema tables
    pub fn init(db_path: &Path, config: &StoreConfig) -> StResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("initializing document store at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| StError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
        }

        info!("document store initialized");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> StResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| StError::Pool(e.to_string()))
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> StResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| StError::Store(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(StError::Store(format!("integrity check failed: {result}")));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a database transaction.
    ///
    /// The transaction rolls back if `f` returns an error.
    pub fn transaction<T, F>(&self, f: F) -> StResult<T>
    where
        F: FnOnce(&Connection) -> StResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StError::Store(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| StError::Store(e.to_string()))?;

        Ok(result)
    }

    /// Document counts per top-level collection.
    pub fn stats(&self) -> StResult<DatabaseStats> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT collection, COUNT(*) FROM documents
                 GROUP BY collection ORDER BY collection",
            )
            .map_err(|e| StError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| StError::Store(e.to_string()))?;

        let mut collections = Vec::new();
        for row in rows {
            collections.push(row.map_err(|e| StError::Store(e.to_string()))?);
        }
        Ok(DatabaseStats { collections })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> StResult<()> {
        warn!("resetting document store - all data will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        info!("document store reset complete");
        Ok(())
    }
}

/// Document counts per collection path.
#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    pub collections: Vec<(String, i64)>,
}

impl DatabaseStats {
    /// Total number of documents.
    pub fn total(&self) -> i64 {
        self.collections.iter().map(|(_, n)| n).sum()
    }
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .collections
            .iter()
            .map(|(c, n)| format!("{c}={n}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;",
        )?;

        Ok(())
    }
}
