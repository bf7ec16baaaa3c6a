mod storage_error;

pub use storage_error::StorageError;

/// Result alias used across the workspace.
pub type EgoNetResult<T> = Result<T, EgoNetError>;

/// Top-level error for every ego network operation.
#[derive(Debug, thiserror::Error)]
pub enum EgoNetError {
    /// Malformed ids, inverted time ranges, or operating on an unregistered context.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Duplicate creation where create-only semantics apply.
    #[error("already exists: {what}")]
    AlreadyExists { what: String },

    /// Lookup of a nonexistent node, edge, or context.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Use of a context after it was removed from its network.
    #[error("context {context} has been removed")]
    AlreadyRemoved { context: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// A persisted blob could not be decoded.
    #[error("corrupt data at {key}: {reason}")]
    CorruptData { key: String, reason: String },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("invalid configuration: {reason}")]
    ConfigError { reason: String },

    #[error("lock poisoned: {resource}")]
    LockPoisoned { resource: String },
}

impl EgoNetError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptData {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures of the storage adapter itself (retry may succeed).
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}
