//! In-process telemetry adapters (counters and timers).

use knowledge_search_domain::{MetricsSnapshot, TimerSummary};
use knowledge_search_ports::{TelemetryPort, TelemetryTags, TelemetryTimer};
use knowledge_search_shared::{REDACTED, is_secret_key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

const TARGET: &str = "knowledge_search::metrics";

/// Telemetry adapter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

struct NoopTimer;

impl TelemetryTimer for NoopTimer {
    fn stop(&self) {}
}

impl TelemetryPort for NoopTelemetry {
    fn increment_counter(&self, _name: &str, _value: u64, _tags: Option<&TelemetryTags>) {}

    fn record_timer_ms(&self, _name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {}

    fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(NoopTimer)
    }
}

/// Telemetry adapter keeping running totals in memory.
///
/// Every sample is also emitted as a `trace` event so a subscriber can
/// forward it elsewhere. Totals are keyed by metric name only.
#[derive(Clone, Default)]
pub struct InMemoryTelemetry {
    state: Arc<Mutex<MetricsSnapshot>>,
}

impl InMemoryTelemetry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<MetricsSnapshot>) -> MutexGuard<'_, MetricsSnapshot> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn record_timer(state: &Mutex<MetricsSnapshot>, name: &str, duration_ms: u64) {
    let mut guard = lock_state(state);
    guard
        .timers
        .entry(name.into())
        .or_insert_with(TimerSummary::default)
        .record(duration_ms);
}

impl TelemetryPort for InMemoryTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        {
            let mut guard = self.lock();
            let total = guard.counters.entry(name.into()).or_insert(0);
            *total = total.saturating_add(value);
        }
        tracing::trace!(
            target: TARGET,
            metric = name,
            kind = "counter",
            value,
            tags = %render_tags(tags),
        );
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        record_timer(&self.state, name, duration_ms);
        tracing::trace!(
            target: TARGET,
            metric = name,
            kind = "timer",
            duration_ms,
            tags = %render_tags(tags),
        );
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(InMemoryTimer {
            state: Arc::clone(&self.state),
            name: name.into(),
            tags: render_tags(tags).into_boxed_str(),
            started_at: Instant::now(),
            stopped: AtomicBool::new(false),
        })
    }

    fn snapshot(&self) -> Option<MetricsSnapshot> {
        Some(self.lock().clone())
    }
}

struct InMemoryTimer {
    state: Arc<Mutex<MetricsSnapshot>>,
    name: Box<str>,
    tags: Box<str>,
    started_at: Instant,
    stopped: AtomicBool,
}

impl TelemetryTimer for InMemoryTimer {
    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let duration_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or_default();
        record_timer(&self.state, &self.name, duration_ms);
        tracing::trace!(
            target: TARGET,
            metric = %self.name,
            kind = "timer",
            duration_ms,
            tags = %self.tags,
        );
    }
}

fn render_tags(tags: Option<&TelemetryTags>) -> String {
    let Some(tags) = tags else {
        return String::new();
    };
    tags.iter()
        .map(|(key, value)| {
            if is_secret_key(key) {
                format!("{key}={REDACTED}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_search_ports::telemetry_tags;

    #[test]
    fn counters_and_timers_accumulate() {
        let telemetry = InMemoryTelemetry::new();
        telemetry.increment_counter("search.requests", 1, None);
        telemetry.increment_counter("search.requests", 2, None);
        telemetry.record_timer_ms("search.latency_ms", 40, None);
        telemetry.record_timer_ms("search.latency_ms", 10, None);

        let snapshot = telemetry.snapshot().unwrap_or_default();
        assert_eq!(snapshot.counters.get("search.requests"), Some(&3));
        let latency = snapshot.timers.get("search.latency_ms").copied().unwrap_or_default();
        assert_eq!(latency.count, 2);
        assert_eq!(latency.total_ms, 50);
        assert_eq!(latency.max_ms, 40);
    }

    #[test]
    fn timer_records_once() {
        let telemetry = InMemoryTelemetry::new();
        let timer = telemetry.start_timer("search.embed", None);
        timer.stop();
        timer.stop();

        let snapshot = telemetry.snapshot().unwrap_or_default();
        assert_eq!(snapshot.timers.get("search.embed").map(|timer| timer.count), Some(1));
    }

    #[test]
    fn clones_share_totals() {
        let telemetry = InMemoryTelemetry::new();
        let clone = telemetry.clone();
        clone.increment_counter("search.hits.returned", 5, None);
        assert_eq!(
            telemetry
                .snapshot()
                .and_then(|snapshot| snapshot.counters.get("search.hits.returned").copied()),
            Some(5)
        );
    }

    #[test]
    fn secret_tags_are_redacted() {
        let tags = telemetry_tags([("collection", "unified-index"), ("apiKey", "abc")]);
        let rendered = render_tags(Some(&tags));
        assert!(rendered.contains("collection=unified-index"));
        assert!(rendered.contains(&format!("apiKey={REDACTED}")));
        assert!(!rendered.contains("abc"));
    }

    #[test]
    fn noop_keeps_no_snapshot() {
        let telemetry = NoopTelemetry;
        telemetry.increment_counter("search.requests", 1, None);
        telemetry.start_timer("search.embed", None).stop();
        assert_eq!(telemetry.snapshot(), None);
    }
}
