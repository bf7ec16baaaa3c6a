use chrono::{DateTime, Utc};

use crate::models::{Interaction, Node};

/// Derives an edge's tie strength from its interaction log.
pub trait ITieStrengthScorer: Send + Sync {
    /// Score in `[0, 1]` of `interactions` as seen at logical time `now_tick`.
    ///
    /// Must be non-decreasing when an interaction stamped `now_tick` is added
    /// and non-increasing as `now_tick` advances.
    fn score(&self, interactions: &[Interaction], now_tick: u64) -> f64;
}

/// Derives a node's popularity from its presence history.
pub trait INodeScorer: Send + Sync {
    fn score(&self, node: &Node, now: DateTime<Utc>) -> f64;
}
