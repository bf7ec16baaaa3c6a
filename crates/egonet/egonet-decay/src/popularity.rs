use chrono::{DateTime, Utc};

use egonet_core::config::PopularityConfig;
use egonet_core::models::Node;
use egonet_core::traits::INodeScorer;

/// Shortest age considered, so a node created a moment ago does not divide by ~0.
const MIN_AGE_SECS: i64 = 60;

/// Node popularity from presence churn.
///
/// Formula: `1 - e^(-(onlineToggles / ageDays) / scaleTogglesPerDay)`.
/// Range: 0.0 – <1.0. A node that never toggled scores 0.
#[derive(Debug, Clone, Default)]
pub struct PopularityScorer {
    config: PopularityConfig,
}

impl PopularityScorer {
    pub fn new(config: PopularityConfig) -> Self {
        Self { config }
    }
}

impl INodeScorer for PopularityScorer {
    fn score(&self, node: &Node, now: DateTime<Utc>) -> f64 {
        let age_secs = (now - node.created_at()).num_seconds().max(MIN_AGE_SECS);
        let age_days = age_secs as f64 / 86_400.0;
        let rate = node.online_toggles() as f64 / age_days;
        1.0 - (-rate / self.config.scale_toggles_per_day).exp()
    }
}
