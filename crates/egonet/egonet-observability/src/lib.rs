//! # egonet-observability
//!
//! Structured tracing: subscriber setup driven by `ObservabilityConfig`
//! and span definitions for the blocking network operations.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, spans};
