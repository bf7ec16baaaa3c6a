//! # egonet-core
//!
//! Foundation crate for the contextual ego network.
//! Defines the shared types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::EgoNetConfig;
pub use errors::{EgoNetError, EgoNetResult};
pub use models::{ContextKey, EgoNetworkEvent, Interaction, ModuleData, Node, Payload};
