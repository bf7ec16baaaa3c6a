use egonet_core::config::TieStrengthConfig;
use egonet_core::models::Interaction;

use crate::factors;

/// Two-term tie-strength formula.
///
/// ```text
/// tieStrength = bucketWeight  × (1 - e^(-Σ kernel(bucketAge) / saturation))
///             + recencyWeight × e^(-(now - lastTick) / recencyScale)
/// ```
///
/// Result is clamped to [0.0, 1.0].
pub fn compute(config: &TieStrengthConfig, interactions: &[Interaction], now_tick: u64) -> f64 {
    let bucket = factors::recurrency::calculate(config, interactions, now_tick);
    let recency = factors::recency::calculate(config, interactions, now_tick);
    (config.bucket_weight * bucket + config.recency_weight * recency).clamp(0.0, 1.0)
}

/// Each term individually, for debugging/observability.
#[derive(Debug, Clone, PartialEq)]
pub struct TieStrengthBreakdown {
    pub windowed_mass: f64,
    pub interactions_in_window: usize,
    pub bucket_term: f64,
    pub recency_term: f64,
    pub tie_strength: f64,
}

pub fn compute_breakdown(
    config: &TieStrengthConfig,
    interactions: &[Interaction],
    now_tick: u64,
) -> TieStrengthBreakdown {
    let (mass, in_window) = factors::recurrency::windowed_mass(config, interactions, now_tick);
    let bucket = 1.0 - (-mass / config.saturation).exp();
    let recency = factors::recency::calculate(config, interactions, now_tick);
    let tie_strength = (config.bucket_weight * bucket + config.recency_weight * recency).clamp(0.0, 1.0);

    TieStrengthBreakdown {
        windowed_mass: mass,
        interactions_in_window: in_window,
        bucket_term: bucket,
        recency_term: recency,
        tie_strength,
    }
}
