use egonet_core::config::TieStrengthConfig;
use egonet_core::models::Interaction;

/// Recency factor: `e^(-(now - lastTick) / recencyScale)`.
///
/// Range: 0.0 – 1.0. An empty log has no recency at all.
pub fn calculate(config: &TieStrengthConfig, interactions: &[Interaction], now_tick: u64) -> f64 {
    let last_tick = match interactions.iter().map(Interaction::tick).max() {
        Some(t) => t,
        None => return 0.0,
    };
    let elapsed = now_tick.saturating_sub(last_tick) as f64;
    (-elapsed / config.recency_scale_ticks).exp()
}
