use egonet_core::config::ObservabilityConfig;
use egonet_observability::{init_tracing, spans};

#[test]
fn second_init_is_rejected_without_panicking() {
    let config = ObservabilityConfig {
        log_level: "debug".into(),
        json: true,
    };
    let _ = init_tracing(&config);
    assert!(!init_tracing(&config));
}

#[test]
fn invalid_level_falls_back_instead_of_panicking() {
    let config = ObservabilityConfig {
        log_level: "not a [valid filter".into(),
        json: false,
    };
    // Either installs with the fallback filter or reports an existing one.
    let _ = init_tracing(&config);
}

#[test]
fn span_macros_use_declared_names() {
    let _ = init_tracing(&ObservabilityConfig {
        log_level: "trace".into(),
        json: false,
    });

    let span = egonet_observability::prune_span!("ctx", 0.5);
    if let Some(meta) = span.metadata() {
        assert_eq!(meta.name(), spans::names::PRUNE);
    }
    let span = egonet_observability::save_span!("root");
    if let Some(meta) = span.metadata() {
        assert_eq!(meta.name(), spans::names::SAVE);
    }
    let span = egonet_observability::load_span!("ctx");
    if let Some(meta) = span.metadata() {
        assert_eq!(meta.name(), spans::names::LOAD);
    }
    let span = egonet_observability::cleanup_span!(3usize, 0.1);
    if let Some(meta) = span.metadata() {
        assert_eq!(meta.name(), spans::names::CLEANUP);
    }
}
