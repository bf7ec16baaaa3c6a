//! SQLite blob store: one `blobs(key, data, updated_at)` table behind a single
//! serialized connection.

pub mod pragmas;

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use egonet_core::errors::{EgoNetError, EgoNetResult};
use egonet_core::traits::IBlobStorage;

use crate::to_storage_err;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS blobs (
    key        TEXT PRIMARY KEY NOT NULL,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL
);
";

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open a store backed by a database file on disk.
    pub fn open(path: &Path) -> EgoNetResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        pragmas::apply_pragmas(&conn)?;
        Self::initialize(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> EgoNetResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> EgoNetResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> EgoNetResult<T>
    where
        F: FnOnce(&Connection) -> EgoNetResult<T>,
    {
        let guard = self.conn.lock().map_err(|e| EgoNetError::LockPoisoned {
            resource: format!("sqlite connection: {e}"),
        })?;
        f(&guard)
    }

    /// Number of stored blobs.
    pub fn count(&self) -> EgoNetResult<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))
                .map_err(|e| to_storage_err(e.to_string()))?;
            Ok(n as usize)
        })
    }
}

impl IBlobStorage for SqliteStorage {
    fn get(&self, key: &str) -> EgoNetResult<Option<Vec<u8>>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT data FROM blobs WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()
            .map_err(|e| to_storage_err(e.to_string()))
        })
    }

    fn put(&self, key: &str, blob: &[u8]) -> EgoNetResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO blobs (key, data, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![key, blob, Utc::now().to_rfc3339()],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> EgoNetResult<bool> {
        self.with_conn(|conn| {
            let removed = conn
                .execute("DELETE FROM blobs WHERE key = ?1", params![key])
                .map_err(|e| to_storage_err(e.to_string()))?;
            Ok(removed > 0)
        })
    }
}
