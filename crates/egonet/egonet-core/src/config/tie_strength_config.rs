use serde::{Deserialize, Serialize};

use super::defaults;

/// Shape of the weight given to older recurrency buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayKernel {
    /// `kernel_decay ^ bucket_age`.
    Exponential,
    /// `1 - bucket_age / bucket_count`.
    Linear,
}

/// Tie-strength tunables. See `egonet-decay` for the formula they feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TieStrengthConfig {
    /// Number of slots in the recurrency ring.
    pub bucket_count: usize,
    /// Logical ticks covered by one bucket.
    pub ticks_per_bucket: u64,
    pub kernel: DecayKernel,
    /// Per-bucket multiplier of the exponential kernel, in (0, 1].
    pub kernel_decay: f64,
    /// Weighted interaction mass at which the bucket term reaches ~63%.
    pub saturation: f64,
    /// Weight of the bucket term. `bucket_weight + recency_weight` must be 1.
    pub bucket_weight: f64,
    /// Weight of the recency term.
    pub recency_weight: f64,
    /// Ticks after which the recency term falls to 1/e.
    pub recency_scale_ticks: f64,
}

impl Default for TieStrengthConfig {
    fn default() -> Self {
        Self {
            bucket_count: defaults::DEFAULT_BUCKET_COUNT,
            ticks_per_bucket: defaults::DEFAULT_TICKS_PER_BUCKET,
            kernel: DecayKernel::Exponential,
            kernel_decay: defaults::DEFAULT_KERNEL_DECAY,
            saturation: defaults::DEFAULT_SATURATION,
            bucket_weight: defaults::DEFAULT_BUCKET_WEIGHT,
            recency_weight: defaults::DEFAULT_RECENCY_WEIGHT,
            recency_scale_ticks: defaults::DEFAULT_RECENCY_SCALE_TICKS,
        }
    }
}

impl TieStrengthConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.bucket_count == 0 {
            return Err("tie_strength.bucket_count must be positive".into());
        }
        if self.ticks_per_bucket == 0 {
            return Err("tie_strength.ticks_per_bucket must be positive".into());
        }
        if !(self.kernel_decay > 0.0 && self.kernel_decay <= 1.0) {
            return Err(format!(
                "tie_strength.kernel_decay must be in (0, 1], got {}",
                self.kernel_decay
            ));
        }
        if !(self.saturation > 0.0) {
            return Err("tie_strength.saturation must be positive".into());
        }
        if !(self.recency_scale_ticks > 0.0) {
            return Err("tie_strength.recency_scale_ticks must be positive".into());
        }
        for (name, w) in [
            ("bucket_weight", self.bucket_weight),
            ("recency_weight", self.recency_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(format!("tie_strength.{name} must be in [0, 1], got {w}"));
            }
        }
        let total = self.bucket_weight + self.recency_weight;
        if (total - 1.0).abs() > 1e-9 {
            return Err(format!(
                "tie_strength weights must sum to 1, got {total}"
            ));
        }
        Ok(())
    }
}
