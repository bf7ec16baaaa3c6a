//! Context: one situational partition of the ego network, loaded lazily.
//!
//! A context is `Unloaded`, `Loaded` or `Removed`. Every accessor takes the
//! per-context lock, forces the load, and then reads or mutates the partition
//! inside the same lock scope. Listener events raised meanwhile are queued
//! and delivered once the lock is released.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use egonet_core::config::TieStrengthConfig;
use egonet_core::constants::{context_partition_key, FORMAT_VERSION};
use egonet_core::errors::{EgoNetError, EgoNetResult};
use egonet_core::models::{ContextKey, EgoNetworkEvent, Interaction, ModuleData, Node, Payload};
use egonet_core::traits::{IBlobStorage, ITieStrengthScorer};
use egonet_decay::{pruning, RecurrencyBuckets};
use egonet_observability::{load_span, prune_span, save_span};

use crate::edge::Edge;
use crate::listeners::ListenerSet;
use crate::persist::{self, ContextRecord};
use crate::registry::NodeRegistry;

/// Collaborators a context shares with its owning network.
#[derive(Clone)]
pub(crate) struct ContextDeps {
    pub storage: Arc<dyn IBlobStorage>,
    pub root: String,
    pub registry: NodeRegistry,
    pub ego_id: String,
    pub scorer: Arc<dyn ITieStrengthScorer>,
    pub tie_strength: TieStrengthConfig,
    pub listeners: ListenerSet,
}

type EdgeKey = (String, String);

/// In-memory state of a loaded context.
struct Partition {
    nodes: BTreeSet<String>,
    edges: BTreeMap<EdgeKey, Edge>,
    buckets: RecurrencyBuckets,
    total_active_time: i64,
    tick: u64,
    modules: ModuleData,
    dirty: bool,
}

impl Partition {
    fn empty(ego_id: &str, config: &TieStrengthConfig) -> Self {
        Self {
            nodes: BTreeSet::from([ego_id.to_string()]),
            edges: BTreeMap::new(),
            buckets: RecurrencyBuckets::from_config(config),
            total_active_time: 0,
            tick: 0,
            modules: ModuleData::new(),
            dirty: true,
        }
    }

    fn from_record(record: ContextRecord, ego_id: &str) -> Self {
        let mut nodes: BTreeSet<String> =
            record.nodes.iter().map(|n| n.id().to_string()).collect();
        nodes.insert(ego_id.to_string());
        let edges = record
            .edges
            .into_iter()
            .map(|e| ((e.src().to_string(), e.dst().to_string()), e))
            .collect();
        Self {
            nodes,
            edges,
            buckets: record.buckets,
            total_active_time: record.total_active_time,
            tick: record.tick,
            modules: record.modules,
            dirty: false,
        }
    }

    /// Advance logical time for one structural mutation.
    fn bump(&mut self) -> u64 {
        self.tick += 1;
        self.buckets.advance_to(self.tick);
        self.dirty = true;
        self.tick
    }

    fn require_member(&self, id: &str) -> EgoNetResult<()> {
        if self.nodes.contains(id) {
            Ok(())
        } else {
            Err(EgoNetError::not_found(format!("node {id} in context")))
        }
    }

    fn edge(&self, src: &str, dst: &str) -> EgoNetResult<&Edge> {
        self.edges
            .get(&(src.to_string(), dst.to_string()))
            .ok_or_else(|| EgoNetError::not_found(format!("edge {src} -> {dst}")))
    }

    fn edge_mut(&mut self, src: &str, dst: &str) -> EgoNetResult<&mut Edge> {
        self.edges
            .get_mut(&(src.to_string(), dst.to_string()))
            .ok_or_else(|| EgoNetError::not_found(format!("edge {src} -> {dst}")))
    }

    fn incident(&self, id: &str) -> Vec<EdgeKey> {
        self.edges
            .keys()
            .filter(|(src, dst)| src == id || dst == id)
            .cloned()
            .collect()
    }

    fn collect_edges(&self, keep: impl Fn(&Edge) -> bool) -> Vec<Edge> {
        self.edges.values().filter(|e| keep(e)).cloned().collect()
    }
}

enum State {
    Unloaded,
    Loaded(Partition),
    Removed,
}

/// One situational subgraph of the ego network.
///
/// Nodes are referenced by id into the network's registry. The ego is a
/// member of every context and cannot be removed from it.
pub struct Context {
    key: ContextKey,
    data: Payload,
    storage_key: String,
    deps: ContextDeps,
    state: Mutex<State>,
}

impl Context {
    /// A context created in this session: loaded, empty, dirty.
    pub(crate) fn fresh(deps: ContextDeps, key: ContextKey, data: Payload) -> Self {
        let partition = Partition::empty(&deps.ego_id, &deps.tie_strength);
        Self::with_state(deps, key, data, State::Loaded(partition))
    }

    /// A context listed in the root index; its partition loads on first access.
    pub(crate) fn discovered(deps: ContextDeps, key: ContextKey, data: Payload) -> Self {
        Self::with_state(deps, key, data, State::Unloaded)
    }

    fn with_state(deps: ContextDeps, key: ContextKey, data: Payload, state: State) -> Self {
        Self {
            storage_key: context_partition_key(&deps.root, key.as_str()),
            key,
            data,
            deps,
            state: Mutex::new(state),
        }
    }

    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    /// The caller payload this context was created with.
    pub fn data(&self) -> &Payload {
        &self.data
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    // ── State ─────────────────────────────────────────────────────────────

    pub fn is_loaded(&self) -> EgoNetResult<bool> {
        Ok(matches!(*self.lock()?, State::Loaded(_)))
    }

    pub fn is_removed(&self) -> EgoNetResult<bool> {
        Ok(matches!(*self.lock()?, State::Removed))
    }

    /// True when loaded with unsaved changes.
    pub fn is_dirty(&self) -> EgoNetResult<bool> {
        Ok(matches!(&*self.lock()?, State::Loaded(p) if p.dirty))
    }

    /// Load the partition if it is not loaded yet.
    ///
    /// On failure the context stays `Unloaded` and a later call retries.
    pub fn load(&self) -> EgoNetResult<()> {
        self.with_partition(|_, _| Ok(()))
    }

    /// Write the full partition. The dirty bit is cleared only once the
    /// write succeeded.
    pub fn save(&self) -> EgoNetResult<()> {
        let _span = save_span!(self.key).entered();
        self.with_partition(|p, events| {
            let blob = self.encode(p)?;
            self.deps.storage.put(&self.storage_key, &blob)?;
            p.dirty = false;
            debug!(context = %self.key, bytes = blob.len(), "context saved");
            events.push(EgoNetworkEvent::ContextSaved {
                context: self.key.clone(),
            });
            Ok(())
        })
    }

    /// Save pending changes and drop the in-memory partition. The next
    /// access reloads it.
    pub fn unload(&self) -> EgoNetResult<()> {
        let mut events = Vec::new();
        let result = self.unload_locked(&mut events);
        self.deps.listeners.dispatch(&events);
        result
    }

    fn unload_locked(&self, events: &mut Vec<EgoNetworkEvent>) -> EgoNetResult<()> {
        let mut state = self.lock()?;
        let pending = match &*state {
            State::Removed => return Err(self.removed()),
            State::Unloaded => return Ok(()),
            State::Loaded(p) if p.dirty => Some(self.encode(p)?),
            State::Loaded(_) => None,
        };
        if let Some(blob) = pending {
            let _span = save_span!(self.key).entered();
            self.deps.storage.put(&self.storage_key, &blob)?;
            events.push(EgoNetworkEvent::ContextSaved {
                context: self.key.clone(),
            });
        }
        *state = State::Unloaded;
        debug!(context = %self.key, "context unloaded");
        Ok(())
    }

    /// Delete the partition from storage. Every later access fails with
    /// `AlreadyRemoved`.
    pub fn remove_from_storage(&self) -> EgoNetResult<()> {
        let mut state = self.lock()?;
        if matches!(*state, State::Removed) {
            return Err(self.removed());
        }
        let existed = self.deps.storage.delete(&self.storage_key)?;
        *state = State::Removed;
        drop(state);
        info!(context = %self.key, existed, "context removed from storage");
        self.deps
            .listeners
            .dispatch(&[EgoNetworkEvent::ContextRemoved {
                context: self.key.clone(),
            }]);
        Ok(())
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    /// Add a registered node. Fails with `NotFound` for an unknown id and
    /// `AlreadyExists` if it is already a member.
    pub fn add_node(&self, node_id: &str) -> EgoNetResult<()> {
        self.with_partition(|p, events| {
            if p.nodes.contains(node_id) {
                return Err(EgoNetError::AlreadyExists {
                    what: format!("node {node_id} in context {}", self.key),
                });
            }
            self.insert_node(p, node_id, events)
        })
    }

    /// Add a registered node unless already a member. Returns whether it was added.
    pub fn add_node_if_necessary(&self, node_id: &str) -> EgoNetResult<bool> {
        self.with_partition(|p, events| {
            if p.nodes.contains(node_id) {
                return Ok(false);
            }
            self.insert_node(p, node_id, events)?;
            Ok(true)
        })
    }

    fn insert_node(
        &self,
        p: &mut Partition,
        node_id: &str,
        events: &mut Vec<EgoNetworkEvent>,
    ) -> EgoNetResult<()> {
        if !self.deps.registry.contains(node_id) {
            return Err(EgoNetError::not_found(format!("node {node_id}")));
        }
        p.nodes.insert(node_id.to_string());
        p.bump();
        events.push(EgoNetworkEvent::NodeAddedToContext {
            context: self.key.clone(),
            node: node_id.to_string(),
        });
        Ok(())
    }

    /// Remove a member and every incident edge with its interaction log.
    pub fn remove_node(&self, node_id: &str) -> EgoNetResult<()> {
        self.with_partition(|p, events| {
            self.reject_ego(node_id)?;
            p.require_member(node_id)?;
            self.drop_node(p, node_id, events);
            Ok(())
        })
    }

    /// Like [`Context::remove_node`], but a non-member is not an error.
    pub fn remove_node_if_exists(&self, node_id: &str) -> EgoNetResult<bool> {
        self.with_partition(|p, events| {
            self.reject_ego(node_id)?;
            if !p.nodes.contains(node_id) {
                return Ok(false);
            }
            self.drop_node(p, node_id, events);
            Ok(true)
        })
    }

    fn drop_node(&self, p: &mut Partition, node_id: &str, events: &mut Vec<EgoNetworkEvent>) {
        let incident = p.incident(node_id);
        for (src, dst) in incident {
            p.edges.remove(&(src.clone(), dst.clone()));
            events.push(EgoNetworkEvent::EdgeRemoved {
                context: self.key.clone(),
                src,
                dst,
            });
        }
        p.nodes.remove(node_id);
        p.bump();
        events.push(EgoNetworkEvent::NodeRemovedFromContext {
            context: self.key.clone(),
            node: node_id.to_string(),
        });
    }

    fn reject_ego(&self, node_id: &str) -> EgoNetResult<()> {
        if node_id == self.deps.ego_id {
            return Err(EgoNetError::invalid("the ego cannot be removed from a context"));
        }
        Ok(())
    }

    pub fn contains_node(&self, node_id: &str) -> EgoNetResult<bool> {
        self.with_partition(|p, _| Ok(p.nodes.contains(node_id)))
    }

    /// Member ids, sorted.
    pub fn node_ids(&self) -> EgoNetResult<Vec<String>> {
        self.with_partition(|p, _| Ok(p.nodes.iter().cloned().collect()))
    }

    /// Member nodes from the registry, sorted by id.
    pub fn nodes(&self) -> EgoNetResult<Vec<Node>> {
        self.with_partition(|p, _| {
            Ok(p
                .nodes
                .iter()
                .filter_map(|id| self.deps.registry.get(id))
                .collect())
        })
    }

    pub fn node_count(&self) -> EgoNetResult<usize> {
        self.with_partition(|p, _| Ok(p.nodes.len()))
    }

    // ── Edges ─────────────────────────────────────────────────────────────

    /// Create `src → dst`. Both endpoints must be members; a duplicate
    /// ordered pair fails with `AlreadyExists`.
    pub fn add_edge(&self, src: &str, dst: &str) -> EgoNetResult<Edge> {
        self.with_partition(|p, events| {
            if p.edges.contains_key(&(src.to_string(), dst.to_string())) {
                return Err(EgoNetError::AlreadyExists {
                    what: format!("edge {src} -> {dst} in context {}", self.key),
                });
            }
            self.insert_edge(p, src, dst, events)
        })
    }

    /// Return `src → dst`, creating it first if needed.
    pub fn get_or_add_edge(&self, src: &str, dst: &str) -> EgoNetResult<Edge> {
        self.with_partition(|p, events| {
            if let Some(edge) = p.edges.get(&(src.to_string(), dst.to_string())) {
                return Ok(edge.clone());
            }
            self.insert_edge(p, src, dst, events)
        })
    }

    fn insert_edge(
        &self,
        p: &mut Partition,
        src: &str,
        dst: &str,
        events: &mut Vec<EgoNetworkEvent>,
    ) -> EgoNetResult<Edge> {
        let edge = Edge::new(src, dst)?;
        p.require_member(src)?;
        p.require_member(dst)?;
        p.edges
            .insert((src.to_string(), dst.to_string()), edge.clone());
        p.bump();
        events.push(EgoNetworkEvent::EdgeCreated {
            context: self.key.clone(),
            src: src.to_string(),
            dst: dst.to_string(),
        });
        Ok(edge)
    }

    pub fn get_edge(&self, src: &str, dst: &str) -> EgoNetResult<Edge> {
        self.with_partition(|p, _| p.edge(src, dst).cloned())
    }

    pub fn has_edge(&self, src: &str, dst: &str) -> EgoNetResult<bool> {
        self.with_partition(|p, _| Ok(p.edges.contains_key(&(src.to_string(), dst.to_string()))))
    }

    /// Remove `src → dst` and its interaction log. Returns the removed edge.
    pub fn remove_edge(&self, src: &str, dst: &str) -> EgoNetResult<Edge> {
        self.with_partition(|p, events| {
            let edge = p
                .edges
                .remove(&(src.to_string(), dst.to_string()))
                .ok_or_else(|| EgoNetError::not_found(format!("edge {src} -> {dst}")))?;
            p.bump();
            events.push(EgoNetworkEvent::EdgeRemoved {
                context: self.key.clone(),
                src: src.to_string(),
                dst: dst.to_string(),
            });
            Ok(edge)
        })
    }

    /// Edges leaving `node_id`. `NotFound` if it is not a member.
    pub fn out_edges(&self, node_id: &str) -> EgoNetResult<Vec<Edge>> {
        self.with_partition(|p, _| {
            p.require_member(node_id)?;
            Ok(p.collect_edges(|e| e.src() == node_id))
        })
    }

    /// Edges entering `node_id`. `NotFound` if it is not a member.
    pub fn in_edges(&self, node_id: &str) -> EgoNetResult<Vec<Edge>> {
        self.with_partition(|p, _| {
            p.require_member(node_id)?;
            Ok(p.collect_edges(|e| e.dst() == node_id))
        })
    }

    /// Both `a → b` and `b → a`, whichever exist.
    pub fn edges_between(&self, a: &str, b: &str) -> EgoNetResult<Vec<Edge>> {
        self.with_partition(|p, _| {
            Ok(p.collect_edges(|e| {
                (e.src() == a && e.dst() == b) || (e.src() == b && e.dst() == a)
            }))
        })
    }

    /// Every edge, ordered by `(src, dst)`.
    pub fn edges(&self) -> EgoNetResult<Vec<Edge>> {
        self.with_partition(|p, _| Ok(p.collect_edges(|_| true)))
    }

    pub fn edge_count(&self) -> EgoNetResult<usize> {
        self.with_partition(|p, _| Ok(p.edges.len()))
    }

    // ── Interactions ──────────────────────────────────────────────────────

    /// Append an instantaneous interaction to `src → dst`.
    pub fn add_interaction(
        &self,
        src: &str,
        dst: &str,
        start_time: i64,
        type_tag: i32,
        payload: Payload,
    ) -> EgoNetResult<Interaction> {
        self.append(
            src,
            dst,
            Interaction::instantaneous(start_time, type_tag, payload),
        )
    }

    /// Append an interaction spanning `[start_time, end_time]` to `src → dst`.
    /// An inverted range fails with `InvalidArgument` and changes nothing.
    pub fn add_interaction_span(
        &self,
        src: &str,
        dst: &str,
        start_time: i64,
        end_time: i64,
        type_tag: i32,
        payload: Payload,
    ) -> EgoNetResult<Interaction> {
        let interaction = Interaction::new(start_time, end_time, type_tag, payload)?;
        self.append(src, dst, interaction)
    }

    fn append(&self, src: &str, dst: &str, interaction: Interaction) -> EgoNetResult<Interaction> {
        interaction.validate()?;
        self.with_partition(|p, events| {
            p.edge(src, dst)?;
            let tick = p.tick + 1;
            let interaction = interaction.stamped(tick);
            p.edge_mut(src, dst)?.add_interaction(interaction.clone())?;
            p.bump();
            p.buckets.record(tick);
            p.total_active_time = p.total_active_time.saturating_add(interaction.duration());
            let score = p.edge_mut(src, dst)?.refresh(self.deps.scorer.as_ref(), tick);
            debug!(context = %self.key, edge = %format!("{src} -> {dst}"), tick, score, "interaction added");
            events.push(EgoNetworkEvent::InteractionAdded {
                context: self.key.clone(),
                src: src.to_string(),
                dst: dst.to_string(),
                interaction: interaction.clone(),
            });
            Ok(interaction)
        })
    }

    /// Record a low-fidelity detected-interaction tag on `src → dst`.
    ///
    /// Counts as one contribution in the recurrency buckets but neither
    /// advances the tick nor enters the tie-strength score.
    pub fn add_detected_interaction(&self, src: &str, dst: &str, tag: &str) -> EgoNetResult<()> {
        self.with_partition(|p, events| {
            p.edge_mut(src, dst)?.add_detected_interaction(tag)?;
            let tick = p.tick;
            p.buckets.record(tick);
            p.dirty = true;
            events.push(EgoNetworkEvent::DetectedInteraction {
                context: self.key.clone(),
                src: src.to_string(),
                dst: dst.to_string(),
                tag: tag.to_string(),
            });
            Ok(())
        })
    }

    // ── Scoring & pruning ─────────────────────────────────────────────────

    /// Current tie strength of `src → dst`, rescored if stale.
    pub fn tie_strength(&self, src: &str, dst: &str) -> EgoNetResult<f64> {
        self.with_partition(|p, _| {
            let tick = p.tick;
            let edge = p.edge_mut(src, dst)?;
            if edge.is_stale(tick) {
                edge.refresh(self.deps.scorer.as_ref(), tick);
            }
            Ok(edge.tie_strength())
        })
    }

    /// Remove every edge whose tie strength is strictly below `threshold`.
    /// Returns the number removed.
    ///
    /// Pruning does not advance the tick, so a second call with no mutation
    /// in between removes nothing.
    pub fn remove_weak_edges(&self, threshold: f64) -> EgoNetResult<usize> {
        let _span = prune_span!(self.key, threshold).entered();
        self.with_partition(|p, events| {
            let tick = p.tick;
            let scorer = self.deps.scorer.as_ref();
            let mut doomed = Vec::new();
            for (key, edge) in p.edges.iter_mut() {
                if edge.is_stale(tick) {
                    edge.refresh(scorer, tick);
                }
                let decision = pruning::evaluate(edge.src(), edge.dst(), edge.tie_strength(), threshold);
                if decision.prune {
                    debug!(
                        context = %self.key,
                        edge = %format!("{} -> {}", decision.src, decision.dst),
                        tie_strength = decision.tie_strength,
                        threshold = decision.threshold,
                        "pruning weak edge"
                    );
                    doomed.push(key.clone());
                }
            }
            for (src, dst) in &doomed {
                p.edges.remove(&(src.clone(), dst.clone()));
                events.push(EgoNetworkEvent::EdgeRemoved {
                    context: self.key.clone(),
                    src: src.clone(),
                    dst: dst.clone(),
                });
            }
            if !doomed.is_empty() {
                p.dirty = true;
                info!(context = %self.key, removed = doomed.len(), threshold, "weak edges removed");
            }
            Ok(doomed.len())
        })
    }

    /// Remove `src → dst` if its tie strength is strictly below `threshold`.
    pub fn remove_weak_edge(&self, src: &str, dst: &str, threshold: f64) -> EgoNetResult<bool> {
        self.with_partition(|p, events| {
            let tick = p.tick;
            let edge = p.edge_mut(src, dst)?;
            if edge.is_stale(tick) {
                edge.refresh(self.deps.scorer.as_ref(), tick);
            }
            if !pruning::should_prune(edge.tie_strength(), threshold) {
                return Ok(false);
            }
            p.edges.remove(&(src.to_string(), dst.to_string()));
            p.dirty = true;
            events.push(EgoNetworkEvent::EdgeRemoved {
                context: self.key.clone(),
                src: src.to_string(),
                dst: dst.to_string(),
            });
            Ok(true)
        })
    }

    // ── Module data ───────────────────────────────────────────────────────

    /// Typed slot of `module` on this context, created from `T::default()`
    /// on first use. Module data never advances the tick.
    pub fn module_instance<T>(&self, module: &str) -> EgoNetResult<T>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        self.with_partition(|p, _| {
            let (instance, created) = p.modules.get_or_create_instance(module)?;
            p.dirty |= created;
            Ok(instance)
        })
    }

    pub fn set_module_instance<T: Serialize>(&self, module: &str, value: &T) -> EgoNetResult<()> {
        self.with_partition(|p, _| {
            p.modules.set_instance(module, value)?;
            p.dirty = true;
            Ok(())
        })
    }

    /// Raw slot of `module` on this context, if any.
    pub fn module_data(&self, module: &str) -> EgoNetResult<Option<Payload>> {
        self.with_partition(|p, _| Ok(p.modules.get(module).cloned()))
    }

    /// Typed slot of `module` on `src → dst`, created on first use.
    pub fn edge_module_instance<T>(&self, src: &str, dst: &str, module: &str) -> EgoNetResult<T>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        self.with_partition(|p, _| {
            let (instance, created) = p
                .edge_mut(src, dst)?
                .modules_mut()
                .get_or_create_instance(module)?;
            p.dirty |= created;
            Ok(instance)
        })
    }

    pub fn set_edge_module_instance<T: Serialize>(
        &self,
        src: &str,
        dst: &str,
        module: &str,
        value: &T,
    ) -> EgoNetResult<()> {
        self.with_partition(|p, _| {
            p.edge_mut(src, dst)?.modules_mut().set_instance(module, value)?;
            p.dirty = true;
            Ok(())
        })
    }

    // ── Activity ──────────────────────────────────────────────────────────

    /// Logical time: the number of structural mutations so far.
    pub fn tick(&self) -> EgoNetResult<u64> {
        self.with_partition(|p, _| Ok(p.tick))
    }

    /// Sum of the durations of every appended interaction, in seconds.
    pub fn total_active_time(&self) -> EgoNetResult<i64> {
        self.with_partition(|p, _| Ok(p.total_active_time))
    }

    pub fn recurrency_buckets(&self) -> EgoNetResult<RecurrencyBuckets> {
        self.with_partition(|p, _| Ok(p.buckets.clone()))
    }

    /// Share of activity per recurrency bucket, in percent. `None` without
    /// activity in the window.
    pub fn recurrency_profile(&self) -> EgoNetResult<Option<Vec<f64>>> {
        self.with_partition(|p, _| Ok(p.buckets.profile()))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn lock(&self) -> EgoNetResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| EgoNetError::LockPoisoned {
            resource: format!("context {}", self.key),
        })
    }

    fn removed(&self) -> EgoNetError {
        EgoNetError::AlreadyRemoved {
            context: self.key.to_string(),
        }
    }

    /// Run `op` on the loaded partition, loading it first if needed, then
    /// deliver the queued events outside the lock.
    fn with_partition<T>(
        &self,
        op: impl FnOnce(&mut Partition, &mut Vec<EgoNetworkEvent>) -> EgoNetResult<T>,
    ) -> EgoNetResult<T> {
        let mut events = Vec::new();
        let result = self.locked(&mut events, op);
        self.deps.listeners.dispatch(&events);
        result
    }

    fn locked<T>(
        &self,
        events: &mut Vec<EgoNetworkEvent>,
        op: impl FnOnce(&mut Partition, &mut Vec<EgoNetworkEvent>) -> EgoNetResult<T>,
    ) -> EgoNetResult<T> {
        let mut state = self.lock()?;
        if matches!(*state, State::Unloaded) {
            let partition = self.read_partition()?;
            *state = State::Loaded(partition);
            events.push(EgoNetworkEvent::ContextLoaded {
                context: self.key.clone(),
            });
        }
        match &mut *state {
            State::Loaded(p) => op(p, events),
            State::Unloaded | State::Removed => Err(self.removed()),
        }
    }

    fn read_partition(&self) -> EgoNetResult<Partition> {
        let _span = load_span!(self.key).entered();
        let blob = self.deps.storage.get(&self.storage_key)?.ok_or_else(|| {
            EgoNetError::corrupt(&self.storage_key, "listed partition is missing")
        })?;
        let record = persist::decode_context(&self.storage_key, &blob)?;
        if record.key != self.key {
            return Err(EgoNetError::corrupt(
                &self.storage_key,
                format!("partition belongs to context {}", record.key),
            ));
        }
        // Registry entries win over partition snapshots.
        let mut adopted = 0;
        for node in &record.nodes {
            if self.deps.registry.insert_if_absent(node.clone()) {
                adopted += 1;
            }
        }
        let partition = Partition::from_record(record, &self.deps.ego_id);
        info!(
            context = %self.key,
            nodes = partition.nodes.len(),
            edges = partition.edges.len(),
            tick = partition.tick,
            adopted,
            "context loaded"
        );
        Ok(partition)
    }

    fn encode(&self, p: &Partition) -> EgoNetResult<Vec<u8>> {
        let record = ContextRecord {
            format_version: FORMAT_VERSION,
            key: self.key.clone(),
            data: self.data.clone(),
            nodes: p
                .nodes
                .iter()
                .filter_map(|id| self.deps.registry.get(id))
                .collect(),
            edges: p.edges.values().cloned().collect(),
            buckets: p.buckets.clone(),
            total_active_time: p.total_active_time,
            tick: p.tick,
            modules: p.modules.clone(),
        };
        persist::encode(&record)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("key", &self.key)
            .field("loaded", &self.is_loaded().ok())
            .finish()
    }
}
