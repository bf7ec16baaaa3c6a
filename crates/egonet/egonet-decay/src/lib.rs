//! # egonet-decay
//!
//! Scoring engines for the ego network:
//! tie strength of edges, popularity of nodes, and the pruning rule applied
//! to weak edges.

pub mod buckets;
pub mod engine;
pub mod factors;
pub mod formula;
pub mod popularity;
pub mod pruning;

pub use buckets::RecurrencyBuckets;
pub use engine::TieStrengthEngine;
pub use formula::TieStrengthBreakdown;
pub use popularity::PopularityScorer;
pub use pruning::PruneDecision;
