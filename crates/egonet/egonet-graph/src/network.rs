//! ContextualEgoNetwork: root aggregate owning the ego, the node registry
//! and every context.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use egonet_core::config::EgoNetConfig;
use egonet_core::constants::{root_index_key, FORMAT_VERSION};
use egonet_core::errors::{EgoNetError, EgoNetResult};
use egonet_core::models::{ContextKey, EgoNetworkEvent, Node, Payload};
use egonet_core::traits::{IBlobStorage, IEgoNetworkListener, INodeScorer, ITieStrengthScorer};
use egonet_decay::{PopularityScorer, TieStrengthEngine};
use egonet_observability::{cleanup_span, save_span};

use crate::context::{Context, ContextDeps};
use crate::persist::{self, ContextEntry, RootRecord};

/// The ego's personal network, partitioned into contexts.
///
/// The ego is fixed for the lifetime of the instance. Nodes live in one
/// registry shared with every context; contexts are keyed by the hash of
/// their payload.
pub struct ContextualEgoNetwork {
    config: EgoNetConfig,
    deps: ContextDeps,
    node_scorer: Arc<dyn INodeScorer>,
    contexts: DashMap<ContextKey, Arc<Context>>,
    current: Mutex<Option<ContextKey>>,
}

impl ContextualEgoNetwork {
    /// Create a brand-new network under `root` with a freshly identified ego.
    /// Nothing is written until [`ContextualEgoNetwork::save`]. A root that
    /// already holds a network fails with `AlreadyExists`; use
    /// [`ContextualEgoNetwork::create_or_load`] to attach to it.
    pub fn new(
        storage: Arc<dyn IBlobStorage>,
        root: impl Into<String>,
        ego_payload: Payload,
        config: EgoNetConfig,
    ) -> EgoNetResult<Self> {
        let root = root.into();
        if storage.contains(&root_index_key(&root))? {
            return Err(EgoNetError::AlreadyExists {
                what: format!("ego network at {root}"),
            });
        }
        let scorer = Arc::new(TieStrengthEngine::new(config.tie_strength.clone()));
        Self::fresh(storage, root, ego_payload, config, scorer)
    }

    /// Attach to the network stored under `root`, or initialise a fresh one
    /// there. Repeated calls on the same root yield the same ego.
    pub fn create_or_load(
        storage: Arc<dyn IBlobStorage>,
        root: impl Into<String>,
        ego_payload: Payload,
        config: EgoNetConfig,
    ) -> EgoNetResult<Self> {
        let scorer = Arc::new(TieStrengthEngine::new(config.tie_strength.clone()));
        Self::create_or_load_with_scorer(storage, root, ego_payload, config, scorer)
    }

    /// [`ContextualEgoNetwork::create_or_load`] with a custom tie-strength policy.
    pub fn create_or_load_with_scorer(
        storage: Arc<dyn IBlobStorage>,
        root: impl Into<String>,
        ego_payload: Payload,
        config: EgoNetConfig,
        scorer: Arc<dyn ITieStrengthScorer>,
    ) -> EgoNetResult<Self> {
        let root = root.into();
        let index_key = root_index_key(&root);
        match storage.get(&index_key)? {
            Some(blob) => {
                let record = persist::decode_root(&index_key, &blob)?;
                Self::attach(storage, root, record, ego_payload, config, scorer)
            }
            None => {
                let network = Self::fresh(storage, root, ego_payload, config, scorer)?;
                network.save_root()?;
                info!(root = %network.deps.root, ego = %network.deps.ego_id, "initialised new ego network");
                Ok(network)
            }
        }
    }

    fn fresh(
        storage: Arc<dyn IBlobStorage>,
        root: String,
        ego_payload: Payload,
        config: EgoNetConfig,
        scorer: Arc<dyn ITieStrengthScorer>,
    ) -> EgoNetResult<Self> {
        let ego = Node::new(Uuid::new_v4().to_string(), ego_payload)?;
        Self::assemble(storage, root, ego, config, scorer)
    }

    fn attach(
        storage: Arc<dyn IBlobStorage>,
        root: String,
        record: RootRecord,
        ego_payload: Payload,
        config: EgoNetConfig,
        scorer: Arc<dyn ITieStrengthScorer>,
    ) -> EgoNetResult<Self> {
        if record.ego.payload != ego_payload {
            debug!(ego = record.ego.id(), "stored ego payload kept over the supplied one");
        }
        let network = Self::assemble(storage, root, record.ego, config, scorer)?;
        for alter in record.alters {
            network.deps.registry.insert_if_absent(alter);
        }
        for entry in record.contexts {
            let context = Context::discovered(network.deps.clone(), entry.key.clone(), entry.data);
            network.contexts.insert(entry.key, Arc::new(context));
        }
        if let Some(current) = record.current {
            if network.contexts.contains_key(&current) {
                *network.lock_current()? = Some(current);
            }
        }
        info!(
            root = %network.deps.root,
            ego = %network.deps.ego_id,
            contexts = network.contexts.len(),
            nodes = network.deps.registry.len(),
            "attached to stored ego network"
        );
        Ok(network)
    }

    fn assemble(
        storage: Arc<dyn IBlobStorage>,
        root: String,
        ego: Node,
        config: EgoNetConfig,
        scorer: Arc<dyn ITieStrengthScorer>,
    ) -> EgoNetResult<Self> {
        config.validate()?;
        if root.trim().is_empty() {
            return Err(EgoNetError::invalid("storage root cannot be empty"));
        }
        let deps = ContextDeps {
            storage,
            root,
            registry: Default::default(),
            ego_id: ego.id().to_string(),
            scorer,
            tie_strength: config.tie_strength.clone(),
            listeners: Default::default(),
        };
        deps.registry.insert_if_absent(ego);
        Ok(Self {
            node_scorer: Arc::new(PopularityScorer::new(config.popularity.clone())),
            config,
            deps,
            contexts: DashMap::new(),
            current: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &EgoNetConfig {
        &self.config
    }

    pub fn root(&self) -> &str {
        &self.deps.root
    }

    pub fn add_listener(&self, listener: Arc<dyn IEgoNetworkListener>) -> EgoNetResult<()> {
        self.deps.listeners.add(listener)
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    pub fn ego_id(&self) -> &str {
        &self.deps.ego_id
    }

    /// Snapshot of the ego node.
    pub fn ego(&self) -> EgoNetResult<Node> {
        self.node(&self.deps.ego_id)
    }

    pub fn node(&self, id: &str) -> EgoNetResult<Node> {
        self.deps
            .registry
            .get(id)
            .ok_or_else(|| EgoNetError::not_found(format!("node {id}")))
    }

    /// Return the node registered under `id`, creating it if needed. The node
    /// is not added to any context.
    pub fn get_or_create_node(&self, id: &str, payload: Payload) -> EgoNetResult<Node> {
        let (node, created) = self
            .deps
            .registry
            .get_or_insert_with(id, || Node::new(id, payload))?;
        if created {
            debug!(node = id, "node created");
            self.emit(EgoNetworkEvent::NodeCreated {
                node: id.to_string(),
            });
        }
        Ok(node)
    }

    /// Every non-ego node, sorted by id.
    pub fn alters(&self) -> Vec<Node> {
        let ego = self.deps.ego_id.as_str();
        self.deps
            .registry
            .snapshot()
            .into_iter()
            .filter(|n| n.id() != ego)
            .collect()
    }

    /// Update a node's presence. Returns whether the status changed.
    pub fn set_online_status(&self, id: &str, online: bool) -> EgoNetResult<bool> {
        self.deps
            .registry
            .update(id, |n| n.set_online_status(online))
            .ok_or_else(|| EgoNetError::not_found(format!("node {id}")))
    }

    /// Typed slot of `module` on node `id`, created from `T::default()` on
    /// first use. Persisted with the node on the next save.
    pub fn node_module_instance<T>(&self, id: &str, module: &str) -> EgoNetResult<T>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        self.deps
            .registry
            .update(id, |n| n.modules_mut().get_or_create_instance(module))
            .ok_or_else(|| EgoNetError::not_found(format!("node {id}")))?
            .map(|(instance, _)| instance)
    }

    pub fn set_node_module_instance<T: Serialize>(
        &self,
        id: &str,
        module: &str,
        value: &T,
    ) -> EgoNetResult<()> {
        self.deps
            .registry
            .update(id, |n| n.modules_mut().set_instance(module, value))
            .ok_or_else(|| EgoNetError::not_found(format!("node {id}")))?
    }

    /// Recompute the popularity score of every node as of `now`.
    pub fn refresh_node_scores(&self, now: DateTime<Utc>) -> usize {
        let scorer = self.node_scorer.as_ref();
        let refreshed = self
            .deps
            .registry
            .update_all(|n| {
                let score = scorer.score(n, now);
                n.set_score(score);
            });
        debug!(refreshed, "node scores refreshed");
        refreshed
    }

    /// [`ContextualEgoNetwork::remove_inactive_nodes_below`] with the
    /// configured `inactive_node_threshold`.
    pub fn remove_inactive_nodes(&self) -> EgoNetResult<Vec<String>> {
        self.remove_inactive_nodes_below(self.config.network.inactive_node_threshold)
    }

    /// Remove from the current context every alter whose stored popularity
    /// score is below `threshold`. Returns the removed ids; empty without a
    /// current context.
    pub fn remove_inactive_nodes_below(&self, threshold: f64) -> EgoNetResult<Vec<String>> {
        let Some(context) = self.current_context()? else {
            return Ok(Vec::new());
        };
        let mut removed = Vec::new();
        for node in context.nodes()? {
            if node.id() != self.deps.ego_id && node.score() < threshold {
                context.remove_node(node.id())?;
                removed.push(node.id().to_string());
            }
        }
        if !removed.is_empty() {
            info!(context = %context.key(), removed = removed.len(), threshold, "inactive nodes removed");
        }
        Ok(removed)
    }

    /// Remove a node from every context and from the registry, then save.
    /// Returns `false` if no such node exists; the ego cannot be removed.
    pub fn remove_node_if_exists(&self, id: &str) -> EgoNetResult<bool> {
        if id == self.deps.ego_id {
            return Err(EgoNetError::invalid("the ego cannot be removed"));
        }
        if !self.deps.registry.contains(id) {
            return Ok(false);
        }
        for context in self.contexts() {
            context.remove_node_if_exists(id)?;
        }
        self.deps.registry.remove(id);
        info!(node = id, "node removed from network");
        self.emit(EgoNetworkEvent::NodeRemoved {
            node: id.to_string(),
        });
        self.save()?;
        Ok(true)
    }

    // ── Contexts ──────────────────────────────────────────────────────────

    /// Create and register a context for `payload`. `AlreadyExists` if one
    /// with an equal payload is registered.
    pub fn create_context(&self, payload: Payload) -> EgoNetResult<Arc<Context>> {
        let key = ContextKey::from_payload(&payload)?;
        let context = match self.contexts.entry(key.clone()) {
            Entry::Occupied(_) => {
                return Err(EgoNetError::AlreadyExists {
                    what: format!("context {key}"),
                })
            }
            Entry::Vacant(slot) => {
                let context = Arc::new(Context::fresh(self.deps.clone(), key.clone(), payload));
                slot.insert(Arc::clone(&context));
                context
            }
        };
        self.context_created(&key);
        Ok(context)
    }

    /// Return the context for `payload`, creating and registering it if needed.
    /// An existing context is returned as is, possibly still unloaded.
    pub fn get_or_create_context(&self, payload: Payload) -> EgoNetResult<Arc<Context>> {
        let key = ContextKey::from_payload(&payload)?;
        let (context, created) = match self.contexts.entry(key.clone()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(slot) => {
                let context = Arc::new(Context::fresh(self.deps.clone(), key.clone(), payload));
                slot.insert(Arc::clone(&context));
                (context, true)
            }
        };
        if created {
            self.context_created(&key);
        }
        Ok(context)
    }

    fn context_created(&self, key: &ContextKey) {
        info!(context = %key, "context created");
        self.emit(EgoNetworkEvent::ContextCreated {
            context: key.clone(),
        });
    }

    /// Look up the context for `payload` without creating it.
    pub fn find_context(&self, payload: &Payload) -> EgoNetResult<Option<Arc<Context>>> {
        let key = ContextKey::from_payload(payload)?;
        Ok(self.context(&key))
    }

    pub fn context(&self, key: &ContextKey) -> Option<Arc<Context>> {
        self.contexts.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Every registered context, sorted by key.
    pub fn contexts(&self) -> Vec<Arc<Context>> {
        let mut contexts: Vec<Arc<Context>> =
            self.contexts.iter().map(|r| Arc::clone(r.value())).collect();
        contexts.sort_by(|a, b| a.key().cmp(b.key()));
        contexts
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Make `context` the current one. `InvalidArgument` unless this very
    /// instance is registered here.
    pub fn set_current(&self, context: &Arc<Context>) -> EgoNetResult<()> {
        self.require_registered(context)?;
        *self.lock_current()? = Some(context.key().clone());
        Ok(())
    }

    pub fn clear_current(&self) -> EgoNetResult<()> {
        *self.lock_current()? = None;
        Ok(())
    }

    pub fn current_context(&self) -> EgoNetResult<Option<Arc<Context>>> {
        let current = self.lock_current()?.clone();
        Ok(current.and_then(|key| self.context(&key)))
    }

    /// Delete `context` and its partition.
    ///
    /// The root index is rewritten without the context before the partition
    /// is deleted, and the context is detached only once both writes
    /// succeeded. On failure the network still holds the context and a
    /// reopen never lists a context whose partition is gone.
    pub fn remove_context(&self, context: &Arc<Context>) -> EgoNetResult<()> {
        self.require_registered(context)?;
        let partition_deleted = context.is_removed()?;
        self.write_root(Some(context.key()))?;
        if partition_deleted {
            debug!(context = %context.key(), "partition already deleted");
        } else if let Err(e) = context.remove_from_storage() {
            warn!(context = %context.key(), error = %e, "partition delete failed; relisting context");
            if let Err(relist) = self.save_root() {
                warn!(context = %context.key(), error = %relist, "relisting context failed");
            }
            return Err(e);
        }
        self.contexts.remove(context.key());
        let mut current = self.lock_current()?;
        if current.as_ref() == Some(context.key()) {
            *current = None;
        }
        Ok(())
    }

    fn require_registered(&self, context: &Arc<Context>) -> EgoNetResult<()> {
        match self.contexts.get(context.key()) {
            Some(registered) if Arc::ptr_eq(registered.value(), context) => Ok(()),
            _ => Err(EgoNetError::invalid(format!(
                "context {} is not registered in this network",
                context.key()
            ))),
        }
    }

    // ── Persistence & upkeep ──────────────────────────────────────────────

    /// Persist every dirty context, then the root index.
    pub fn save(&self) -> EgoNetResult<()> {
        let _span = save_span!("root").entered();
        let mut saved = 0;
        for context in self.contexts() {
            if context.is_dirty()? {
                context.save()?;
                saved += 1;
            }
        }
        self.save_root()?;
        info!(root = %self.deps.root, contexts_saved = saved, "ego network saved");
        Ok(())
    }

    fn save_root(&self) -> EgoNetResult<()> {
        self.write_root(None)
    }

    /// Write the root index, leaving out `excluded` if given.
    fn write_root(&self, excluded: Option<&ContextKey>) -> EgoNetResult<()> {
        let current = self
            .lock_current()?
            .clone()
            .filter(|key| Some(key) != excluded);
        let record = RootRecord {
            format_version: FORMAT_VERSION,
            ego: self.ego()?,
            alters: self.alters(),
            contexts: self
                .contexts()
                .iter()
                .filter(|c| Some(c.key()) != excluded)
                .map(|c| ContextEntry {
                    key: c.key().clone(),
                    data: c.data().clone(),
                })
                .collect(),
            current,
        };
        let blob = persist::encode(&record)?;
        self.deps.storage.put(&root_index_key(&self.deps.root), &blob)
    }

    /// Prune weak edges in every context using the configured threshold.
    /// Returns the total removed.
    ///
    /// With `lenient_cleanup` a failing context is logged and skipped;
    /// otherwise the first failure is returned.
    pub fn cleanup(&self) -> EgoNetResult<usize> {
        let threshold = self.config.network.weak_edge_threshold;
        let contexts = self.contexts();
        let _span = cleanup_span!(contexts.len(), threshold).entered();
        let mut removed = 0;
        for context in contexts {
            match context.remove_weak_edges(threshold) {
                Ok(n) => removed += n,
                Err(e) if self.config.network.lenient_cleanup => {
                    warn!(context = %context.key(), error = %e, "cleanup skipped context");
                }
                Err(e) => return Err(e),
            }
        }
        info!(removed, threshold, "network cleanup complete");
        Ok(removed)
    }

    fn emit(&self, event: EgoNetworkEvent) {
        self.deps.listeners.dispatch(&[event]);
    }

    fn lock_current(&self) -> EgoNetResult<MutexGuard<'_, Option<ContextKey>>> {
        self.current.lock().map_err(|_| EgoNetError::LockPoisoned {
            resource: "current context".into(),
        })
    }
}

impl std::fmt::Debug for ContextualEgoNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualEgoNetwork")
            .field("root", &self.deps.root)
            .field("ego", &self.deps.ego_id)
            .field("contexts", &self.contexts.len())
            .finish()
    }
}
