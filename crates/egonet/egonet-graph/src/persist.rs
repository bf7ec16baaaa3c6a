//! Persisted records for the root index and context partitions.
//!
//! Records are JSON blobs stamped with [`FORMAT_VERSION`]. Any decode or
//! validation failure surfaces as `CorruptData` naming the storage key.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use egonet_core::constants::FORMAT_VERSION;
use egonet_core::errors::{EgoNetError, EgoNetResult};
use egonet_core::models::{ContextKey, ModuleData, Node, Payload};
use egonet_decay::RecurrencyBuckets;

use crate::edge::Edge;

/// One context partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub format_version: u32,
    pub key: ContextKey,
    pub data: Payload,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub buckets: RecurrencyBuckets,
    pub total_active_time: i64,
    pub tick: u64,
    #[serde(default, skip_serializing_if = "ModuleData::is_empty")]
    pub modules: ModuleData,
}

/// A context listed in the root index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub key: ContextKey,
    pub data: Payload,
}

/// The root index: ego, node registry, registered contexts, current marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootRecord {
    pub format_version: u32,
    pub ego: Node,
    #[serde(default)]
    pub alters: Vec<Node>,
    pub contexts: Vec<ContextEntry>,
    pub current: Option<ContextKey>,
}

pub fn encode<T: Serialize>(record: &T) -> EgoNetResult<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Decode and validate a context partition stored under `storage_key`.
pub fn decode_context(storage_key: &str, blob: &[u8]) -> EgoNetResult<ContextRecord> {
    let record: ContextRecord =
        serde_json::from_slice(blob).map_err(|e| EgoNetError::corrupt(storage_key, e))?;
    check_version(storage_key, record.format_version)?;
    record
        .buckets
        .validate()
        .map_err(|reason| EgoNetError::corrupt(storage_key, reason))?;

    let mut members = BTreeSet::new();
    for node in &record.nodes {
        node.validate()
            .map_err(|e| EgoNetError::corrupt(storage_key, e))?;
        if !members.insert(node.id()) {
            return Err(EgoNetError::corrupt(
                storage_key,
                format!("duplicate node {}", node.id()),
            ));
        }
    }

    let mut pairs = BTreeSet::new();
    for edge in &record.edges {
        edge.validate()
            .map_err(|e| EgoNetError::corrupt(storage_key, e))?;
        if !members.contains(edge.src()) || !members.contains(edge.dst()) {
            return Err(EgoNetError::corrupt(
                storage_key,
                format!("edge {} -> {} has a dangling endpoint", edge.src(), edge.dst()),
            ));
        }
        if !pairs.insert((edge.src(), edge.dst())) {
            return Err(EgoNetError::corrupt(
                storage_key,
                format!("duplicate edge {} -> {}", edge.src(), edge.dst()),
            ));
        }
    }
    Ok(record)
}

/// Decode and validate the root index stored under `storage_key`.
pub fn decode_root(storage_key: &str, blob: &[u8]) -> EgoNetResult<RootRecord> {
    let record: RootRecord =
        serde_json::from_slice(blob).map_err(|e| EgoNetError::corrupt(storage_key, e))?;
    check_version(storage_key, record.format_version)?;
    record
        .ego
        .validate()
        .map_err(|e| EgoNetError::corrupt(storage_key, e))?;
    for alter in &record.alters {
        if alter.id() == record.ego.id() {
            return Err(EgoNetError::corrupt(storage_key, "ego listed as an alter"));
        }
        alter
            .validate()
            .map_err(|e| EgoNetError::corrupt(storage_key, e))?;
    }
    Ok(record)
}

fn check_version(storage_key: &str, version: u32) -> EgoNetResult<()> {
    if version != FORMAT_VERSION {
        return Err(EgoNetError::corrupt(
            storage_key,
            format!("unsupported format version {version}, expected {FORMAT_VERSION}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use egonet_core::models::Payload;

    fn record() -> ContextRecord {
        let key = ContextKey::from_payload(&Payload::from("work")).unwrap();
        ContextRecord {
            format_version: FORMAT_VERSION,
            key,
            data: Payload::from("work"),
            nodes: vec![
                Node::new("a", Payload::Null).unwrap(),
                Node::new("b", Payload::Null).unwrap(),
            ],
            edges: vec![Edge::new("a", "b").unwrap()],
            buckets: RecurrencyBuckets::new(4, 1),
            total_active_time: 0,
            tick: 3,
            modules: ModuleData::new(),
        }
    }

    #[test]
    fn valid_record_decodes() {
        let blob = encode(&record()).unwrap();
        assert_eq!(decode_context("k", &blob).unwrap(), record());
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = decode_context("k", b"{not json").unwrap_err();
        assert!(matches!(err, EgoNetError::CorruptData { ref key, .. } if key == "k"));
    }

    #[test]
    fn unknown_version_is_corrupt() {
        let mut r = record();
        r.format_version = FORMAT_VERSION + 1;
        let err = decode_context("k", &encode(&r).unwrap()).unwrap_err();
        assert!(matches!(err, EgoNetError::CorruptData { .. }));
    }

    #[test]
    fn dangling_edge_is_corrupt() {
        let mut r = record();
        r.nodes.pop();
        let err = decode_context("k", &encode(&r).unwrap()).unwrap_err();
        assert!(matches!(err, EgoNetError::CorruptData { .. }));
    }
}
