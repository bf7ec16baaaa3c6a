use serde::{Deserialize, Serialize};

use super::payload::Payload;
use crate::errors::{EgoNetError, EgoNetResult};

/// One timestamped contact event on an edge.
///
/// Times are UNIX seconds. `tick` is the context's logical time at which the
/// interaction was appended; it is assigned by the owning context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    start_time: i64,
    end_time: i64,
    type_tag: i32,
    payload: Payload,
    #[serde(default)]
    tick: u64,
}

impl Interaction {
    /// Create an interaction spanning `[start_time, end_time]`. The span must
    /// not be inverted and its length must fit in an `i64`.
    pub fn new(start_time: i64, end_time: i64, type_tag: i32, payload: Payload) -> EgoNetResult<Self> {
        let interaction = Self {
            start_time,
            end_time,
            type_tag,
            payload,
            tick: 0,
        };
        interaction.validate()?;
        Ok(interaction)
    }

    /// Create an interaction with no duration.
    pub fn instantaneous(start_time: i64, type_tag: i32, payload: Payload) -> Self {
        Self {
            start_time,
            end_time: start_time,
            type_tag,
            payload,
            tick: 0,
        }
    }

    /// Stamp the logical tick at which the interaction was appended.
    pub fn stamped(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    /// Length of the span in seconds. Saturates for spans that were never
    /// validated.
    pub fn duration(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time)
    }

    pub fn type_tag(&self) -> i32 {
        self.type_tag
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn validate(&self) -> EgoNetResult<()> {
        if self.end_time < self.start_time {
            return Err(EgoNetError::invalid(format!(
                "interaction ends before it starts ({} < {})",
                self.end_time, self.start_time
            )));
        }
        if self.end_time.checked_sub(self.start_time).is_none() {
            return Err(EgoNetError::invalid(format!(
                "interaction span [{}, {}] is too long",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}
