pub mod recency;
pub mod recurrency;
