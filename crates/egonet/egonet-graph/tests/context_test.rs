//! Context tests: membership and edge invariants, interaction logging,
//! logical time, pruning, unload/reload, and listener delivery.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use egonet_core::models::{EgoNetworkEvent, Interaction, Payload};
use egonet_core::traits::{IEgoNetworkListener, ITieStrengthScorer};
use egonet_core::{EgoNetConfig, EgoNetError};
use egonet_graph::{Context, ContextualEgoNetwork};
use egonet_storage::MemoryStorage;

fn network() -> ContextualEgoNetwork {
    ContextualEgoNetwork::create_or_load(
        Arc::new(MemoryStorage::new()),
        "egonet",
        Payload::Null,
        EgoNetConfig::default(),
    )
    .unwrap()
}

/// Network plus a "work" context holding alters `ids`.
fn with_members(ids: &[&str]) -> (ContextualEgoNetwork, Arc<Context>) {
    let net = network();
    let ctx = net.create_context(json!("work")).unwrap();
    for id in ids {
        net.get_or_create_node(id, Payload::Null).unwrap();
        ctx.add_node(id).unwrap();
    }
    (net, ctx)
}

/// Scores every edge by its interaction count, capped at 1.
struct CountScorer;

impl ITieStrengthScorer for CountScorer {
    fn score(&self, interactions: &[Interaction], _now_tick: u64) -> f64 {
        (interactions.len() as f64 / 4.0).min(1.0)
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<&'static str>>);

impl IEgoNetworkListener for Recorder {
    fn on_event(&self, event: &EgoNetworkEvent) {
        self.0.lock().unwrap().push(event.name());
    }
}

#[test]
fn fresh_context_holds_only_the_ego() {
    let net = network();
    let ctx = net.create_context(json!("work")).unwrap();
    assert!(ctx.is_loaded().unwrap());
    assert!(ctx.is_dirty().unwrap());
    assert_eq!(ctx.node_ids().unwrap(), vec![net.ego_id().to_string()]);
    assert_eq!(ctx.tick().unwrap(), 0);
    assert_eq!(ctx.recurrency_profile().unwrap(), None);
}

#[test]
fn membership_rules() {
    let (net, ctx) = with_members(&["A"]);
    assert!(matches!(
        ctx.add_node("A").unwrap_err(),
        EgoNetError::AlreadyExists { .. }
    ));
    assert!(!ctx.add_node_if_necessary("A").unwrap());
    assert!(matches!(
        ctx.add_node("unregistered").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
    assert!(matches!(
        ctx.remove_node(net.ego_id()).unwrap_err(),
        EgoNetError::InvalidArgument { .. }
    ));
    assert!(matches!(
        ctx.remove_node("B").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
    assert!(!ctx.remove_node_if_exists("B").unwrap());
}

#[test]
fn edges_need_member_endpoints_and_unique_pairs() {
    let (_net, ctx) = with_members(&["A", "B"]);
    assert!(matches!(
        ctx.add_edge("A", "nobody").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
    assert!(matches!(
        ctx.add_edge("A", "A").unwrap_err(),
        EgoNetError::InvalidArgument { .. }
    ));
    ctx.add_edge("A", "B").unwrap();
    assert!(matches!(
        ctx.add_edge("A", "B").unwrap_err(),
        EgoNetError::AlreadyExists { .. }
    ));
    let again = ctx.get_or_add_edge("A", "B").unwrap();
    assert_eq!(again.src(), "A");
    assert_eq!(ctx.edge_count().unwrap(), 1);
}

#[test]
fn directed_edges_are_distinct() {
    let (_net, ctx) = with_members(&["A", "B"]);
    ctx.add_edge("A", "B").unwrap();
    assert!(!ctx.has_edge("B", "A").unwrap());
    ctx.add_edge("B", "A").unwrap();

    assert_eq!(ctx.out_edges("A").unwrap().len(), 1);
    assert_eq!(ctx.in_edges("A").unwrap().len(), 1);
    assert_eq!(ctx.out_edges("A").unwrap()[0].dst(), "B");
    assert_eq!(ctx.in_edges("A").unwrap()[0].src(), "B");
    assert_eq!(ctx.edges_between("B", "A").unwrap().len(), 2);

    ctx.remove_edge("A", "B").unwrap();
    assert_eq!(ctx.edges_between("A", "B").unwrap().len(), 1);
    assert!(matches!(
        ctx.get_edge("A", "B").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
    assert!(matches!(
        ctx.remove_edge("A", "B").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
}

#[test]
fn removing_a_node_cascades_to_its_edges() {
    let (net, ctx) = with_members(&["A", "B", "C"]);
    ctx.add_edge("A", "B").unwrap();
    ctx.add_edge("C", "A").unwrap();
    ctx.add_edge("B", "C").unwrap();
    ctx.add_edge(net.ego_id(), "A").unwrap();
    ctx.add_interaction("A", "B", 10, 0, Payload::Null).unwrap();

    ctx.remove_node("A").unwrap();
    let edges = ctx.edges().unwrap();
    assert_eq!(edges.len(), 1);
    assert!(edges.iter().all(|e| !e.involves("A")));
    assert!(matches!(
        ctx.out_edges("A").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
    assert!(matches!(
        ctx.in_edges("A").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
    // The node itself stays registered in the network.
    assert!(net.node("A").is_ok());
}

#[test]
fn inverted_interaction_leaves_log_unchanged() {
    let (_net, ctx) = with_members(&["A", "B"]);
    ctx.add_edge("A", "B").unwrap();
    ctx.add_interaction("A", "B", 5, 0, Payload::Null).unwrap();
    let before = ctx.get_edge("A", "B").unwrap();
    let tick = ctx.tick().unwrap();

    let err = ctx
        .add_interaction_span("A", "B", 100, 99, 0, Payload::Null)
        .unwrap_err();
    assert!(matches!(err, EgoNetError::InvalidArgument { .. }));
    assert_eq!(ctx.get_edge("A", "B").unwrap(), before);
    assert_eq!(ctx.tick().unwrap(), tick);
}

#[test]
fn overlong_spans_are_rejected_and_active_time_saturates() {
    let (_net, ctx) = with_members(&["A", "B"]);
    ctx.add_edge("A", "B").unwrap();
    let tick = ctx.tick().unwrap();

    let err = ctx
        .add_interaction_span("A", "B", i64::MIN, i64::MAX, 0, Payload::Null)
        .unwrap_err();
    assert!(matches!(err, EgoNetError::InvalidArgument { .. }));
    assert_eq!(ctx.tick().unwrap(), tick);
    assert_eq!(ctx.get_edge("A", "B").unwrap().interaction_count(), 0);

    ctx.add_interaction_span("A", "B", -1, i64::MAX - 1, 0, Payload::Null)
        .unwrap();
    ctx.add_interaction_span("A", "B", 0, 10, 0, Payload::Null)
        .unwrap();
    assert_eq!(ctx.total_active_time().unwrap(), i64::MAX);
}

#[test]
fn interactions_need_an_existing_edge() {
    let (_net, ctx) = with_members(&["A", "B"]);
    assert!(matches!(
        ctx.add_interaction("A", "B", 0, 0, Payload::Null).unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
    assert_eq!(ctx.total_active_time().unwrap(), 0);
}

#[test]
fn log_keeps_insertion_order_and_stamps_ticks() {
    let (_net, ctx) = with_members(&["A", "B"]);
    ctx.add_edge("A", "B").unwrap();
    let start = ctx.tick().unwrap();
    ctx.add_interaction("A", "B", 300, 0, Payload::Null).unwrap();
    ctx.add_interaction_span("A", "B", 100, 130, 1, json!("late"))
        .unwrap();

    let edge = ctx.get_edge("A", "B").unwrap();
    let starts: Vec<i64> = edge.interactions().iter().map(|i| i.start_time()).collect();
    assert_eq!(starts, vec![300, 100]);
    let ticks: Vec<u64> = edge.interactions().iter().map(|i| i.tick()).collect();
    assert_eq!(ticks, vec![start + 1, start + 2]);
    assert_eq!(edge.interactions()[1].payload(), &json!("late"));
    assert_eq!(ctx.total_active_time().unwrap(), 30);
}

#[test]
fn tick_follows_structural_mutations_only() {
    let (_net, ctx) = with_members(&["A", "B"]);
    assert_eq!(ctx.tick().unwrap(), 2);
    ctx.add_edge("A", "B").unwrap();
    assert_eq!(ctx.tick().unwrap(), 3);
    ctx.add_interaction("A", "B", 0, 0, Payload::Null).unwrap();
    assert_eq!(ctx.tick().unwrap(), 4);

    ctx.add_detected_interaction("A", "B", "bluetooth").unwrap();
    assert_eq!(ctx.tick().unwrap(), 4);
    assert_eq!(ctx.recurrency_buckets().unwrap().total(), 2);
    assert!(ctx.get_edge("A", "B").unwrap().tags().contains("bluetooth"));

    ctx.remove_edge("A", "B").unwrap();
    assert_eq!(ctx.tick().unwrap(), 5);
    ctx.remove_node("B").unwrap();
    assert_eq!(ctx.tick().unwrap(), 6);
}

#[test]
fn tie_strength_decays_as_time_moves_on() {
    let (net, ctx) = with_members(&["A", "B"]);
    ctx.add_edge("A", "B").unwrap();
    ctx.add_interaction("A", "B", 0, 0, Payload::Null).unwrap();
    let fresh = ctx.tie_strength("A", "B").unwrap();
    assert!(fresh > 0.0);

    for i in 0..40 {
        let id = format!("n{i}");
        net.get_or_create_node(&id, Payload::Null).unwrap();
        ctx.add_node(&id).unwrap();
    }
    let later = ctx.tie_strength("A", "B").unwrap();
    assert!(later < fresh);
    assert!(matches!(
        ctx.tie_strength("B", "A").unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
}

#[test]
fn weak_edge_pruning_is_strict_and_idempotent() {
    let storage = MemoryStorage::new();
    let net = ContextualEgoNetwork::create_or_load_with_scorer(
        Arc::new(storage),
        "egonet",
        Payload::Null,
        EgoNetConfig::default(),
        Arc::new(CountScorer),
    )
    .unwrap();
    let ctx = net.create_context(json!("work")).unwrap();
    for id in ["A", "B", "C"] {
        net.get_or_create_node(id, Payload::Null).unwrap();
        ctx.add_node(id).unwrap();
    }
    ctx.add_edge("A", "B").unwrap();
    ctx.add_edge("A", "C").unwrap();
    ctx.add_edge("B", "C").unwrap();
    // A->B scores 0.5, A->C scores 0.25, B->C scores 0.
    for _ in 0..2 {
        ctx.add_interaction("A", "B", 0, 0, Payload::Null).unwrap();
    }
    ctx.add_interaction("A", "C", 0, 0, Payload::Null).unwrap();

    assert!(!ctx.remove_weak_edge("A", "B", 0.5).unwrap());
    assert_eq!(ctx.remove_weak_edges(0.5).unwrap(), 2);
    assert!(ctx.has_edge("A", "B").unwrap());
    assert_eq!(ctx.remove_weak_edges(0.5).unwrap(), 0);
    assert!(ctx.remove_weak_edge("A", "B", 0.51).unwrap());
    assert!(matches!(
        ctx.remove_weak_edge("A", "B", 1.0).unwrap_err(),
        EgoNetError::NotFound { .. }
    ));
}

#[test]
fn unload_saves_and_reloads_on_access() {
    let storage = MemoryStorage::new();
    let net = ContextualEgoNetwork::create_or_load(
        Arc::new(storage.clone()),
        "egonet",
        Payload::Null,
        EgoNetConfig::default(),
    )
    .unwrap();
    let ctx = net.create_context(json!("work")).unwrap();
    net.get_or_create_node("A", Payload::Null).unwrap();
    ctx.add_node("A").unwrap();
    ctx.add_edge(net.ego_id(), "A").unwrap();
    let edges = ctx.edges().unwrap();

    ctx.unload().unwrap();
    assert!(!ctx.is_loaded().unwrap());
    assert!(egonet_core::traits::IBlobStorage::contains(&storage, ctx.storage_key()).unwrap());
    assert_eq!(ctx.edges().unwrap(), edges);
    assert!(ctx.is_loaded().unwrap());
    assert!(!ctx.is_dirty().unwrap());
}

#[derive(Default)]
struct LoadCounter(AtomicUsize);

impl IEgoNetworkListener for LoadCounter {
    fn on_event(&self, event: &EgoNetworkEvent) {
        if matches!(event, EgoNetworkEvent::ContextLoaded { .. }) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn concurrent_first_access_loads_once() {
    let storage = MemoryStorage::new();
    let open = || {
        ContextualEgoNetwork::create_or_load(
            Arc::new(storage.clone()),
            "egonet",
            Payload::Null,
            EgoNetConfig::default(),
        )
        .unwrap()
    };
    {
        let net = open();
        let ctx = net.create_context(json!("work")).unwrap();
        for id in ["A", "B", "C"] {
            net.get_or_create_node(id, Payload::Null).unwrap();
            ctx.add_node(id).unwrap();
            ctx.add_edge(net.ego_id(), id).unwrap();
        }
        net.save().unwrap();
    }

    let net = open();
    let loads = Arc::new(LoadCounter::default());
    net.add_listener(loads.clone()).unwrap();
    let ctx = net.find_context(&json!("work")).unwrap().unwrap();
    assert!(!ctx.is_loaded().unwrap());

    let seen: Vec<(usize, usize)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = Arc::clone(&ctx);
                scope.spawn(move || (ctx.node_count().unwrap(), ctx.edge_count().unwrap()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(seen.iter().all(|&counts| counts == (4, 3)));
    assert_eq!(loads.0.load(Ordering::SeqCst), 1);
    assert!(ctx.is_loaded().unwrap());
    assert!(!ctx.is_dirty().unwrap());
}

#[test]
fn listeners_see_events_in_order() {
    let (net, ctx) = with_members(&["A", "B"]);
    let recorder = Arc::new(Recorder::default());
    net.add_listener(recorder.clone()).unwrap();

    ctx.add_edge("A", "B").unwrap();
    ctx.add_interaction("A", "B", 0, 0, Payload::Null).unwrap();
    ctx.add_detected_interaction("A", "B", "wifi").unwrap();
    ctx.remove_node("B").unwrap();
    ctx.save().unwrap();

    let names = recorder.0.lock().unwrap().clone();
    assert_eq!(
        names,
        vec![
            "edge_created",
            "interaction_added",
            "detected_interaction",
            "edge_removed",
            "node_removed_from_context",
            "context_saved",
        ]
    );
}

/// A listener that queries the context it is notified about.
struct Reentrant {
    ctx: Mutex<Option<Arc<Context>>>,
    seen_edges: Mutex<Vec<usize>>,
}

impl IEgoNetworkListener for Reentrant {
    fn on_event(&self, event: &EgoNetworkEvent) {
        if let EgoNetworkEvent::EdgeCreated { .. } = event {
            if let Some(ctx) = self.ctx.lock().unwrap().as_ref() {
                self.seen_edges
                    .lock()
                    .unwrap()
                    .push(ctx.edge_count().unwrap());
            }
        }
    }
}

#[test]
fn listeners_may_call_back_into_the_context() {
    let (net, ctx) = with_members(&["A", "B"]);
    let listener = Arc::new(Reentrant {
        ctx: Mutex::new(Some(Arc::clone(&ctx))),
        seen_edges: Mutex::new(Vec::new()),
    });
    net.add_listener(listener.clone()).unwrap();
    ctx.add_edge("A", "B").unwrap();
    assert_eq!(*listener.seen_edges.lock().unwrap(), vec![1]);
}
