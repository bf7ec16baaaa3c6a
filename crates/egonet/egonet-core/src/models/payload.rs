use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EgoNetResult;

/// Opaque caller data attached to nodes, contexts, and interactions.
/// The network stores and returns it without interpretation.
pub type Payload = serde_json::Value;

/// Convert any serializable value into a [`Payload`].
pub fn to_payload<T: Serialize>(value: &T) -> EgoNetResult<Payload> {
    Ok(serde_json::to_value(value)?)
}

/// Grouping key of a context: the blake3 hash of its payload's canonical JSON.
///
/// `serde_json` object maps are key-ordered, so structurally equal payloads
/// always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextKey(String);

impl ContextKey {
    pub fn from_payload(payload: &Payload) -> EgoNetResult<Self> {
        let serialized = serde_json::to_string(payload)?;
        Ok(Self(blake3::hash(serialized.as_bytes()).to_hex().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
