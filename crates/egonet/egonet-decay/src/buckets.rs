use serde::{Deserialize, Serialize};

use egonet_core::config::TieStrengthConfig;

/// Fixed-size histogram of context activity over logical time.
///
/// Slot `i` holds the contribution events of every bucket epoch `e` with
/// `e % len == i`. Moving into a newer epoch clears the slots that were
/// skipped over, so the ring never mixes activity from different laps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencyBuckets {
    counts: Vec<u64>,
    ticks_per_bucket: u64,
    epoch: u64,
}

impl RecurrencyBuckets {
    /// Zero-sized parameters are bumped to 1.
    pub fn new(bucket_count: usize, ticks_per_bucket: u64) -> Self {
        Self {
            counts: vec![0; bucket_count.max(1)],
            ticks_per_bucket: ticks_per_bucket.max(1),
            epoch: 0,
        }
    }

    pub fn from_config(config: &TieStrengthConfig) -> Self {
        Self::new(config.bucket_count, config.ticks_per_bucket)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn ticks_per_bucket(&self) -> u64 {
        self.ticks_per_bucket
    }

    /// Bucket epoch containing `tick`.
    pub fn epoch_of(&self, tick: u64) -> u64 {
        tick / self.ticks_per_bucket
    }

    /// Ring slot holding `tick`.
    pub fn slot_of(&self, tick: u64) -> usize {
        (self.epoch_of(tick) % self.counts.len() as u64) as usize
    }

    /// Move the ring forward to `tick`, clearing every slot entered on the way.
    /// Ticks older than the current epoch are ignored.
    pub fn advance_to(&mut self, tick: u64) {
        let target = self.epoch_of(tick);
        if target <= self.epoch {
            return;
        }
        let len = self.counts.len() as u64;
        if target - self.epoch >= len {
            self.counts.iter_mut().for_each(|c| *c = 0);
        } else {
            for e in self.epoch + 1..=target {
                self.counts[(e % len) as usize] = 0;
            }
        }
        self.epoch = target;
    }

    /// Count one contribution event at `tick`.
    pub fn record(&mut self, tick: u64) {
        self.advance_to(tick);
        let slot = self.slot_of(tick.max(self.epoch * self.ticks_per_bucket));
        self.counts[slot] += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Share of activity per slot in percent, or `None` without activity.
    pub fn profile(&self) -> Option<Vec<f64>> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(
            self.counts
                .iter()
                .map(|&c| c as f64 / total as f64 * 100.0)
                .collect(),
        )
    }

    /// Reject decoded state the ring cannot operate on.
    pub fn validate(&self) -> Result<(), String> {
        if self.counts.is_empty() {
            return Err("recurrency bucket array is empty".into());
        }
        if self.ticks_per_bucket == 0 {
            return Err("recurrency ticks_per_bucket is zero".into());
        }
        Ok(())
    }
}
