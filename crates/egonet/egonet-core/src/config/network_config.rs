use serde::{Deserialize, Serialize};

use super::defaults;

/// Root-aggregate behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Threshold used by `cleanup()`; edges scoring strictly below it are pruned.
    pub weak_edge_threshold: f64,
    /// When true, per-context failures during `cleanup()` are logged and skipped.
    pub lenient_cleanup: bool,
    /// Default threshold of `remove_inactive_nodes`.
    pub inactive_node_threshold: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            weak_edge_threshold: defaults::DEFAULT_WEAK_EDGE_THRESHOLD,
            lenient_cleanup: false,
            inactive_node_threshold: defaults::DEFAULT_INACTIVE_NODE_THRESHOLD,
        }
    }
}

/// Node popularity scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularityConfig {
    /// Toggle rate (per day) mapped to a score of ~0.63.
    pub scale_toggles_per_day: f64,
}

impl Default for PopularityConfig {
    fn default() -> Self {
        Self {
            scale_toggles_per_day: defaults::DEFAULT_SCALE_TOGGLES_PER_DAY,
        }
    }
}
