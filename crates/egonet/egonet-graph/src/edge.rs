//! Edge: a directed relation inside one context, with its interaction log.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use egonet_core::errors::{EgoNetError, EgoNetResult};
use egonet_core::models::{Interaction, ModuleData};
use egonet_core::traits::ITieStrengthScorer;

/// Position of an edge relative to the ego.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgoDirection {
    /// ego → alter
    Outgoing,
    /// alter → ego
    Incoming,
    /// Neither endpoint is the ego.
    Unrelated,
}

/// Directed relation `src → dst`.
///
/// The interaction log is append-only and keeps insertion order. The tie
/// strength is a cached score, valid for the context tick in `scored_at_tick`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    src: String,
    dst: String,
    created_at: DateTime<Utc>,
    interactions: Vec<Interaction>,
    tags: BTreeSet<String>,
    tie_strength: f64,
    #[serde(default)]
    scored_at_tick: u64,
    #[serde(default, skip_serializing_if = "ModuleData::is_empty")]
    modules: ModuleData,
}

impl Edge {
    /// Create an empty edge. Empty ids and self-loops are rejected.
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> EgoNetResult<Self> {
        let edge = Self {
            src: src.into(),
            dst: dst.into(),
            created_at: Utc::now(),
            interactions: Vec::new(),
            tags: BTreeSet::new(),
            tie_strength: 0.0,
            scored_at_tick: 0,
            modules: ModuleData::new(),
        };
        edge.validate_endpoints()?;
        Ok(edge)
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dst(&self) -> &str {
        &self.dst
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    pub fn last_interaction(&self) -> Option<&Interaction> {
        self.interactions.last()
    }

    /// Free-text detected-interaction tags.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Cached tie strength as of [`Edge::scored_at_tick`].
    pub fn tie_strength(&self) -> f64 {
        self.tie_strength
    }

    pub fn scored_at_tick(&self) -> u64 {
        self.scored_at_tick
    }

    /// Data other modules attached to this edge.
    pub fn modules(&self) -> &ModuleData {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ModuleData {
        &mut self.modules
    }

    pub fn involves(&self, node_id: &str) -> bool {
        self.src == node_id || self.dst == node_id
    }

    /// The endpoint that is not `ego`, if `ego` is an endpoint.
    pub fn alter(&self, ego: &str) -> Option<&str> {
        if self.src == ego {
            Some(&self.dst)
        } else if self.dst == ego {
            Some(&self.src)
        } else {
            None
        }
    }

    pub fn direction(&self, ego: &str) -> EgoDirection {
        if self.src == ego {
            EgoDirection::Outgoing
        } else if self.dst == ego {
            EgoDirection::Incoming
        } else {
            EgoDirection::Unrelated
        }
    }

    /// Append to the log. An interaction ending before it starts is rejected
    /// and the log is left unchanged.
    pub fn add_interaction(&mut self, interaction: Interaction) -> EgoNetResult<()> {
        interaction.validate()?;
        self.interactions.push(interaction);
        Ok(())
    }

    /// Record a detected-interaction tag. Returns `false` if the tag was
    /// already present.
    pub fn add_detected_interaction(&mut self, tag: impl Into<String>) -> EgoNetResult<bool> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(EgoNetError::invalid("detected interaction tag cannot be empty"));
        }
        Ok(self.tags.insert(tag))
    }

    pub fn is_stale(&self, now_tick: u64) -> bool {
        self.scored_at_tick != now_tick
    }

    /// Rescore at `now_tick` and cache the result.
    pub fn refresh(&mut self, scorer: &dyn ITieStrengthScorer, now_tick: u64) -> f64 {
        let score = scorer.score(&self.interactions, now_tick);
        self.tie_strength = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        self.scored_at_tick = now_tick;
        self.tie_strength
    }

    /// Reject decoded edges [`Edge::new`] and the append path could not produce.
    pub fn validate(&self) -> EgoNetResult<()> {
        self.validate_endpoints()?;
        for interaction in &self.interactions {
            interaction.validate()?;
        }
        if !(0.0..=1.0).contains(&self.tie_strength) {
            return Err(EgoNetError::invalid(format!(
                "tie strength {} out of range",
                self.tie_strength
            )));
        }
        Ok(())
    }

    fn validate_endpoints(&self) -> EgoNetResult<()> {
        if self.src.is_empty() || self.dst.is_empty() {
            return Err(EgoNetError::invalid("edge endpoint id cannot be empty"));
        }
        if self.src == self.dst {
            return Err(EgoNetError::invalid(format!(
                "self-loop on {} is not allowed",
                self.src
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egonet_core::models::Payload;
    use egonet_decay::TieStrengthEngine;

    #[test]
    fn self_loop_is_rejected() {
        let err = Edge::new("a", "a").unwrap_err();
        assert!(matches!(err, EgoNetError::InvalidArgument { .. }));
    }

    #[test]
    fn alter_and_direction_follow_ego() {
        let edge = Edge::new("ego", "bob").unwrap();
        assert_eq!(edge.alter("ego"), Some("bob"));
        assert_eq!(edge.alter("bob"), Some("ego"));
        assert_eq!(edge.alter("carol"), None);
        assert_eq!(edge.direction("ego"), EgoDirection::Outgoing);
        assert_eq!(edge.direction("bob"), EgoDirection::Incoming);
        assert_eq!(edge.direction("carol"), EgoDirection::Unrelated);
    }

    #[test]
    fn duplicate_tag_reports_false() {
        let mut edge = Edge::new("a", "b").unwrap();
        assert!(edge.add_detected_interaction("bluetooth").unwrap());
        assert!(!edge.add_detected_interaction("bluetooth").unwrap());
        assert!(edge.add_detected_interaction("  ").is_err());
        assert_eq!(edge.tags().len(), 1);
    }

    #[test]
    fn refresh_caches_score_and_tick() {
        let mut edge = Edge::new("a", "b").unwrap();
        edge.add_interaction(Interaction::instantaneous(10, 0, Payload::Null).stamped(3))
            .unwrap();
        let engine = TieStrengthEngine::default();
        assert!(edge.is_stale(3));
        let score = edge.refresh(&engine, 3);
        assert!(score > 0.0);
        assert_eq!(edge.tie_strength(), score);
        assert!(!edge.is_stale(3));
    }
}
