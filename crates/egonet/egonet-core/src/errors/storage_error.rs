/// Storage-adapter errors. Every variant surfaces to callers as
/// [`EgoNetError::StorageUnavailable`](super::EgoNetError::StorageUnavailable).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable for key {key}: {reason}")]
    Unavailable { key: String, reason: String },

    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },
}
