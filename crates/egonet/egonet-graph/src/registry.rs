//! NodeRegistry: the single authoritative node store, shared via DashMap.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use egonet_core::models::Node;

/// Thread-safe node store keyed by id.
///
/// Cloning is cheap and shares the underlying map: the network and each of
/// its contexts hold clones of the same registry.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: Arc<DashMap<String, Node>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a node by id (cloned snapshot).
    pub fn get(&self, id: &str) -> Option<Node> {
        self.nodes.get(id).map(|r| r.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert `node` unless its id is taken. Returns whether it was inserted.
    pub fn insert_if_absent(&self, node: Node) -> bool {
        match self.nodes.entry(node.id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    /// Return the node stored under `id`, creating it with `create` first if
    /// needed. The flag reports whether a node was created.
    pub fn get_or_insert_with<E>(
        &self,
        id: &str,
        create: impl FnOnce() -> Result<Node, E>,
    ) -> Result<(Node, bool), E> {
        match self.nodes.entry(id.to_string()) {
            Entry::Occupied(entry) => Ok((entry.get().clone(), false)),
            Entry::Vacant(slot) => {
                let node = create()?;
                slot.insert(node.clone());
                Ok((node, true))
            }
        }
    }

    /// Mutate a node in place. Returns `None` if the id is unknown.
    pub fn update<T>(&self, id: &str, f: impl FnOnce(&mut Node) -> T) -> Option<T> {
        self.nodes.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Mutate every node in place. Returns the number visited.
    pub fn update_all(&self, mut f: impl FnMut(&mut Node)) -> usize {
        let mut visited = 0;
        for mut entry in self.nodes.iter_mut() {
            f(entry.value_mut());
            visited += 1;
        }
        visited
    }

    pub fn remove(&self, id: &str) -> Option<Node> {
        self.nodes.remove(id).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of every node, sorted by id.
    pub fn snapshot(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.iter().map(|r| r.value().clone()).collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egonet_core::models::Payload;
    use egonet_core::EgoNetError;

    #[test]
    fn clones_share_storage() {
        let a = NodeRegistry::new();
        let b = a.clone();
        assert!(a.insert_if_absent(Node::new("x", Payload::Null).unwrap()));
        assert!(b.contains("x"));
        assert!(!b.insert_if_absent(Node::new("x", Payload::Null).unwrap()));
    }

    #[test]
    fn get_or_insert_creates_once() {
        let reg = NodeRegistry::new();
        let (_, created) = reg
            .get_or_insert_with("x", || Node::new("x", Payload::Null))
            .unwrap();
        assert!(created);
        let (_, created) = reg
            .get_or_insert_with("x", || -> Result<Node, EgoNetError> {
                panic!("must not be called for an existing id")
            })
            .unwrap();
        assert!(!created);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn update_reaches_shared_node() {
        let reg = NodeRegistry::new();
        reg.insert_if_absent(Node::new("x", Payload::Null).unwrap());
        assert_eq!(reg.update("x", |n| n.set_online_status(true)), Some(true));
        assert!(reg.get("x").unwrap().is_online());
        assert_eq!(reg.update("missing", |n| n.set_score(1.0)), None);
    }
}
