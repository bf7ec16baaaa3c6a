use crate::errors::EgoNetResult;

/// Durable key → blob store consumed by contexts and the network root.
///
/// Implementations serialize writers per key; the core performs no locking
/// across processes.
pub trait IBlobStorage: Send + Sync {
    /// Fetch a blob. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> EgoNetResult<Option<Vec<u8>>>;

    /// Write a blob, replacing any previous value atomically.
    fn put(&self, key: &str, blob: &[u8]) -> EgoNetResult<()>;

    /// Delete a blob. Returns `false` when the key did not exist.
    fn delete(&self, key: &str) -> EgoNetResult<bool>;

    fn contains(&self, key: &str) -> EgoNetResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
