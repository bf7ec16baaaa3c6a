mod listener;
mod scoring;
mod storage;

pub use listener::IEgoNetworkListener;
pub use scoring::{INodeScorer, ITieStrengthScorer};
pub use storage::IBlobStorage;
