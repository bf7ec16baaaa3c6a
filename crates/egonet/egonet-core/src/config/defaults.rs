//! Default values for every tunable.

// Tie strength
pub const DEFAULT_BUCKET_COUNT: usize = 24;
pub const DEFAULT_TICKS_PER_BUCKET: u64 = 4;
pub const DEFAULT_KERNEL_DECAY: f64 = 0.75;
pub const DEFAULT_SATURATION: f64 = 3.0;
pub const DEFAULT_BUCKET_WEIGHT: f64 = 0.7;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.3;
pub const DEFAULT_RECENCY_SCALE_TICKS: f64 = 16.0;

// Network
pub const DEFAULT_WEAK_EDGE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_INACTIVE_NODE_THRESHOLD: f64 = 0.0;

// Popularity
pub const DEFAULT_SCALE_TOGGLES_PER_DAY: f64 = 4.0;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
