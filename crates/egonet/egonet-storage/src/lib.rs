//! Storage adapters implementing [`IBlobStorage`](egonet_core::traits::IBlobStorage).
//!
//! - [`MemoryStorage`]: process-local map, for tests and ephemeral networks.
//! - [`FileStorage`]: one file per key under a root directory.
//! - [`SqliteStorage`]: a single `blobs` table in a WAL-mode database.

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use egonet_core::errors::{EgoNetError, StorageError};

/// Map a SQLite failure into the workspace error.
pub(crate) fn to_storage_err(message: String) -> EgoNetError {
    EgoNetError::StorageUnavailable(StorageError::Sqlite { message })
}

/// Map an I/O failure at `path` into the workspace error.
pub(crate) fn to_io_err(path: &std::path::Path, err: std::io::Error) -> EgoNetError {
    EgoNetError::StorageUnavailable(StorageError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}
