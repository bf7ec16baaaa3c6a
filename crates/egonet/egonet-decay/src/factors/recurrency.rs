use egonet_core::config::{DecayKernel, TieStrengthConfig};
use egonet_core::models::Interaction;

/// Weight of an interaction `bucket_age` buckets old.
///
/// Exponential: `kernel_decay ^ age`. Linear: `1 - age / bucket_count`.
/// Zero outside the recurrency window.
pub fn kernel(config: &TieStrengthConfig, bucket_age: u64) -> f64 {
    let window = config.bucket_count as u64;
    if bucket_age >= window {
        return 0.0;
    }
    match config.kernel {
        DecayKernel::Exponential => config.kernel_decay.powi(bucket_age.min(i32::MAX as u64) as i32),
        DecayKernel::Linear => 1.0 - bucket_age as f64 / window as f64,
    }
}

/// Age in whole buckets of the context grid. Ticks from the future count as age 0.
pub fn bucket_age(config: &TieStrengthConfig, tick: u64, now_tick: u64) -> u64 {
    let tpb = config.ticks_per_bucket.max(1);
    (now_tick / tpb).saturating_sub(tick / tpb)
}

/// Kernel-weighted interaction mass and the number of interactions inside the window.
pub fn windowed_mass(
    config: &TieStrengthConfig,
    interactions: &[Interaction],
    now_tick: u64,
) -> (f64, usize) {
    interactions
        .iter()
        .map(|i| kernel(config, bucket_age(config, i.tick(), now_tick)))
        .filter(|w| *w > 0.0)
        .fold((0.0, 0), |(mass, n), w| (mass + w, n + 1))
}

/// Saturating bucket term: `1 - e^(-mass / saturation)`. Range: 0.0 – <1.0.
pub fn calculate(config: &TieStrengthConfig, interactions: &[Interaction], now_tick: u64) -> f64 {
    let (mass, _) = windowed_mass(config, interactions, now_tick);
    1.0 - (-mass / config.saturation).exp()
}
