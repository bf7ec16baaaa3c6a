//! # egonet-graph
//!
//! The contextual ego network itself: directed edges with interaction logs,
//! contexts that load their partition lazily from blob storage, and the
//! [`ContextualEgoNetwork`] root that owns the ego, the node registry and
//! every context.

pub mod context;
pub mod edge;
pub mod listeners;
pub mod network;
pub mod persist;
pub mod registry;

pub use context::Context;
pub use edge::{EgoDirection, Edge};
pub use listeners::{ActivityListener, ListenerSet, LoggingListener};
pub use network::ContextualEgoNetwork;
pub use registry::NodeRegistry;
