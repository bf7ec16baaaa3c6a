//! Listener registry and the built-in listeners.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use dashmap::DashMap;
use tracing::{debug, warn};

use egonet_core::constants::{DAYS_PER_WEEK, HOURS_PER_DAY};
use egonet_core::errors::{EgoNetError, EgoNetResult};
use egonet_core::models::EgoNetworkEvent;
use egonet_core::traits::IEgoNetworkListener;

/// Weekday × hour-of-day counts, Monday first, UTC.
pub type WeeklyHistogram = [[u64; HOURS_PER_DAY]; DAYS_PER_WEEK];

/// Listeners shared by a network and its contexts.
#[derive(Clone, Default)]
pub struct ListenerSet {
    listeners: Arc<RwLock<Vec<Arc<dyn IEgoNetworkListener>>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn IEgoNetworkListener>) -> EgoNetResult<()> {
        let mut guard = self.listeners.write().map_err(|_| EgoNetError::LockPoisoned {
            resource: "listener registry".into(),
        })?;
        guard.push(listener);
        Ok(())
    }

    /// Number of registered listeners. A poisoned registry counts as empty.
    pub fn len(&self) -> usize {
        self.listeners.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `events` in order to every listener. The registry lock is
    /// released before any listener runs. Events already committed cannot be
    /// failed, so a poisoned registry drops them with a warning.
    pub fn dispatch(&self, events: &[EgoNetworkEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = match self.listeners.read() {
            Ok(guard) => guard.clone(),
            Err(_) => {
                warn!(dropped = events.len(), "listener registry poisoned; events dropped");
                return;
            }
        };
        for event in events {
            for listener in &listeners {
                listener.on_event(event);
            }
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Logs every event at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl IEgoNetworkListener for LoggingListener {
    fn on_event(&self, event: &EgoNetworkEvent) {
        debug!(event = event.name(), detail = ?event, "ego network event");
    }
}

/// Per-node weekly activity: when, by weekday and hour, a node's
/// interactions start.
#[derive(Debug, Default)]
pub struct ActivityListener {
    histograms: DashMap<String, WeeklyHistogram>,
}

impl ActivityListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn histogram(&self, node_id: &str) -> Option<WeeklyHistogram> {
        self.histograms.get(node_id).map(|h| *h)
    }

    /// Total interactions recorded for `node_id`.
    pub fn total(&self, node_id: &str) -> u64 {
        self.histogram(node_id)
            .map(|h| h.iter().flatten().sum())
            .unwrap_or(0)
    }

    /// Busiest weekday and hour for `node_id`. Ties go to the earliest slot.
    pub fn peak(&self, node_id: &str) -> Option<(Weekday, u32)> {
        let histogram = self.histogram(node_id)?;
        let mut best: Option<(usize, usize, u64)> = None;
        for (day, hours) in histogram.iter().enumerate() {
            for (hour, &count) in hours.iter().enumerate() {
                if count > 0 && best.map_or(true, |(_, _, c)| count > c) {
                    best = Some((day, hour, count));
                }
            }
        }
        best.map(|(day, hour, _)| (weekday_from_index(day), hour as u32))
    }

    fn record(&self, node_id: &str, start_time: i64) {
        let Some(at) = DateTime::<Utc>::from_timestamp(start_time, 0) else {
            warn!(node = node_id, start_time, "interaction start out of range; not recorded");
            return;
        };
        let day = at.weekday().num_days_from_monday() as usize;
        let hour = at.hour() as usize;
        let mut histogram = self
            .histograms
            .entry(node_id.to_string())
            .or_insert([[0; HOURS_PER_DAY]; DAYS_PER_WEEK]);
        histogram[day][hour] += 1;
    }
}

impl IEgoNetworkListener for ActivityListener {
    fn on_event(&self, event: &EgoNetworkEvent) {
        match event {
            EgoNetworkEvent::InteractionAdded {
                src,
                dst,
                interaction,
                ..
            } => {
                self.record(src, interaction.start_time());
                self.record(dst, interaction.start_time());
            }
            EgoNetworkEvent::NodeRemoved { node } => {
                self.histograms.remove(node);
            }
            _ => {}
        }
    }
}

fn weekday_from_index(day: usize) -> Weekday {
    match day {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egonet_core::models::{ContextKey, Interaction, Payload};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl IEgoNetworkListener for Counter {
        fn on_event(&self, _event: &EgoNetworkEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn added(start: i64) -> EgoNetworkEvent {
        EgoNetworkEvent::InteractionAdded {
            context: ContextKey::from_payload(&Payload::Null).unwrap(),
            src: "a".into(),
            dst: "b".into(),
            interaction: Interaction::instantaneous(start, 0, Payload::Null),
        }
    }

    #[test]
    fn dispatch_reaches_every_listener() {
        let set = ListenerSet::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        set.add(counter.clone()).unwrap();
        set.add(Arc::new(LoggingListener)).unwrap();
        set.dispatch(&[added(0), added(1)]);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn activity_buckets_by_weekday_and_hour() {
        let activity = ActivityListener::new();
        // 1970-01-01 was a Thursday; 10:00 UTC
        activity.on_event(&added(10 * 3600));
        activity.on_event(&added(10 * 3600 + 60));
        activity.on_event(&added(0));
        let histogram = activity.histogram("a").unwrap();
        assert_eq!(histogram[3][10], 2);
        assert_eq!(histogram[3][0], 1);
        assert_eq!(activity.total("b"), 3);
        assert_eq!(activity.peak("a"), Some((Weekday::Thu, 10)));
    }

    #[test]
    fn removed_node_forgets_activity() {
        let activity = ActivityListener::new();
        activity.on_event(&added(0));
        activity.on_event(&EgoNetworkEvent::NodeRemoved { node: "a".into() });
        assert!(activity.histogram("a").is_none());
        assert_eq!(activity.peak("a"), None);
    }
}
