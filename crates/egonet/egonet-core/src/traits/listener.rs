use crate::models::EgoNetworkEvent;

/// Observer of structural changes. Called after the change is committed and
/// outside any internal lock, so implementations may query the network.
pub trait IEgoNetworkListener: Send + Sync {
    fn on_event(&self, event: &EgoNetworkEvent);
}
