use egonet_core::config::TieStrengthConfig;
use egonet_core::models::Interaction;
use egonet_core::traits::ITieStrengthScorer;

use crate::formula;

/// Default tie-strength policy: recurrency-bucket kernel plus recency.
#[derive(Debug, Clone, Default)]
pub struct TieStrengthEngine {
    config: TieStrengthConfig,
}

impl TieStrengthEngine {
    /// Create an engine with the given (already validated) tunables.
    pub fn new(config: TieStrengthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TieStrengthConfig {
        &self.config
    }

    /// Score with a full breakdown of each term.
    pub fn calculate_breakdown(
        &self,
        interactions: &[Interaction],
        now_tick: u64,
    ) -> formula::TieStrengthBreakdown {
        formula::compute_breakdown(&self.config, interactions, now_tick)
    }
}

impl ITieStrengthScorer for TieStrengthEngine {
    fn score(&self, interactions: &[Interaction], now_tick: u64) -> f64 {
        formula::compute(&self.config, interactions, now_tick)
    }
}
