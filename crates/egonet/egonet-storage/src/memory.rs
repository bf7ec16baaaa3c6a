//! In-memory blob store backed by a `DashMap`.

use std::sync::Arc;

use dashmap::DashMap;

use egonet_core::errors::EgoNetResult;
use egonet_core::traits::IBlobStorage;

/// Thread-safe in-memory store. Clones share the same map, so a network can be
/// "reopened" against the same data inside one process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl IBlobStorage for MemoryStorage {
    fn get(&self, key: &str) -> EgoNetResult<Option<Vec<u8>>> {
        Ok(self.blobs.get(key).map(|r| r.value().clone()))
    }

    fn put(&self, key: &str, blob: &[u8]) -> EgoNetResult<()> {
        self.blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> EgoNetResult<bool> {
        Ok(self.blobs.remove(key).is_some())
    }

    fn contains(&self, key: &str) -> EgoNetResult<bool> {
        Ok(self.blobs.contains_key(key))
    }
}
