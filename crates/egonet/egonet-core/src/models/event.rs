use super::interaction::Interaction;
use super::payload::ContextKey;

/// Notifications delivered to every registered listener.
#[derive(Debug, Clone, PartialEq)]
pub enum EgoNetworkEvent {
    ContextCreated { context: ContextKey },
    ContextLoaded { context: ContextKey },
    ContextSaved { context: ContextKey },
    ContextRemoved { context: ContextKey },
    /// A node was created in the network registry.
    NodeCreated { node: String },
    /// A node was removed from the whole network.
    NodeRemoved { node: String },
    NodeAddedToContext { context: ContextKey, node: String },
    NodeRemovedFromContext { context: ContextKey, node: String },
    EdgeCreated { context: ContextKey, src: String, dst: String },
    EdgeRemoved { context: ContextKey, src: String, dst: String },
    InteractionAdded {
        context: ContextKey,
        src: String,
        dst: String,
        interaction: Interaction,
    },
    DetectedInteraction {
        context: ContextKey,
        src: String,
        dst: String,
        tag: String,
    },
}

impl EgoNetworkEvent {
    /// Short stable name, used as a log field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContextCreated { .. } => "context_created",
            Self::ContextLoaded { .. } => "context_loaded",
            Self::ContextSaved { .. } => "context_saved",
            Self::ContextRemoved { .. } => "context_removed",
            Self::NodeCreated { .. } => "node_created",
            Self::NodeRemoved { .. } => "node_removed",
            Self::NodeAddedToContext { .. } => "node_added_to_context",
            Self::NodeRemovedFromContext { .. } => "node_removed_from_context",
            Self::EdgeCreated { .. } => "edge_created",
            Self::EdgeRemoved { .. } => "edge_removed",
            Self::InteractionAdded { .. } => "interaction_added",
            Self::DetectedInteraction { .. } => "detected_interaction",
        }
    }
}
