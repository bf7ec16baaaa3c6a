use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::module_data::ModuleData;
use super::payload::Payload;
use crate::errors::{EgoNetError, EgoNetResult};

/// An identity endpoint: the ego or one of its alters.
///
/// Nodes live in a single registry owned by the network; contexts refer to
/// them by id. The popularity `score` is written by the scoring engine, never
/// derived here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: String,
    pub payload: Payload,
    created_at: DateTime<Utc>,
    online: bool,
    online_toggles: u64,
    score: f64,
    #[serde(default, skip_serializing_if = "ModuleData::is_empty")]
    modules: ModuleData,
}

impl Node {
    /// Create a node. Fails with `InvalidArgument` on an empty id.
    pub fn new(id: impl Into<String>, payload: Payload) -> EgoNetResult<Self> {
        Self::with_creation_time(id, payload, Utc::now())
    }

    pub fn with_creation_time(
        id: impl Into<String>,
        payload: Payload,
        created_at: DateTime<Utc>,
    ) -> EgoNetResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(EgoNetError::invalid("node id cannot be an empty string"));
        }
        Ok(Self {
            id,
            payload,
            created_at,
            online: false,
            online_toggles: 0,
            score: 0.0,
            modules: ModuleData::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn online_toggles(&self) -> u64 {
        self.online_toggles
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Update presence. The toggle counter only moves on an actual change.
    /// Returns whether the status changed.
    pub fn set_online_status(&mut self, online: bool) -> bool {
        if self.online == online {
            return false;
        }
        self.online = online;
        self.online_toggles += 1;
        true
    }

    /// Data other modules attached to this node.
    pub fn modules(&self) -> &ModuleData {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ModuleData {
        &mut self.modules
    }

    pub fn set_score(&mut self, score: f64) {
        self.score = score;
    }

    /// Reject records that could not have been produced by [`Node::new`].
    pub fn validate(&self) -> EgoNetResult<()> {
        if self.id.is_empty() {
            return Err(EgoNetError::invalid("node id cannot be an empty string"));
        }
        Ok(())
    }
}
