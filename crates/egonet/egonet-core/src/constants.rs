/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version stamped on every persisted root and context record.
pub const FORMAT_VERSION: u32 = 1;

/// Suffix of the root index key under a network's storage root.
pub const ROOT_INDEX_KEY: &str = "index";

/// Path segment under which context partitions are stored.
pub const CONTEXTS_PREFIX: &str = "contexts";

/// Days in a week and hours in a day, used by weekly activity histograms.
pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

/// Build the storage key of a network's root index.
pub fn root_index_key(root: &str) -> String {
    format!("{root}/{ROOT_INDEX_KEY}")
}

/// Build the storage key of a context partition.
pub fn context_partition_key(root: &str, context_key: &str) -> String {
    format!("{root}/{CONTEXTS_PREFIX}/{context_key}")
}
