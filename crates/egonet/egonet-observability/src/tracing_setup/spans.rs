//! Span definitions per blocking operation: load, save, cleanup, prune.

/// Create a context-load span.
#[macro_export]
macro_rules! load_span {
    ($context:expr) => {
        tracing::info_span!("egonet.load", context = %$context)
    };
}

/// Create a save span. `$scope` is a context key or `"root"`.
#[macro_export]
macro_rules! save_span {
    ($scope:expr) => {
        tracing::info_span!("egonet.save", scope = %$scope)
    };
}

/// Create a network-wide cleanup span.
#[macro_export]
macro_rules! cleanup_span {
    ($context_count:expr, $threshold:expr) => {
        tracing::info_span!(
            "egonet.cleanup",
            contexts = $context_count,
            threshold = $threshold
        )
    };
}

/// Create a weak-edge pruning span.
#[macro_export]
macro_rules! prune_span {
    ($context:expr, $threshold:expr) => {
        tracing::info_span!("egonet.prune", context = %$context, threshold = $threshold)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const LOAD: &str = "egonet.load";
    pub const SAVE: &str = "egonet.save";
    pub const CLEANUP: &str = "egonet.cleanup";
    pub const PRUNE: &str = "egonet.prune";
}
