mod event;
mod interaction;
mod module_data;
mod node;
mod payload;

pub use event::EgoNetworkEvent;
pub use interaction::Interaction;
pub use module_data::ModuleData;
pub use node::Node;
pub use payload::{to_payload, ContextKey, Payload};
