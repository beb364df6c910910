//! Metrics collectors
//!
//! Label sets are rendered into the key as `name{k=v,...}` in the order
//! given.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use pushsync_common::MetricsCollector;
use tracing::debug;

/// Emits every metric as a `debug` event on the `pushsync::metrics` target.
#[derive(Debug, Clone, Default)]
pub struct TracingMetricsCollector;

impl MetricsCollector for TracingMetricsCollector {
    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        debug!(target: "pushsync::metrics", metric = name, kind = "counter", labels = ?labels);
    }

    fn record_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        debug!(target: "pushsync::metrics", metric = name, kind = "gauge", value, labels = ?labels);
    }

    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        debug!(target: "pushsync::metrics", metric = name, kind = "histogram", value, labels = ?labels);
    }
}

#[derive(Debug, Default)]
struct Store {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, f64>,
    histograms: BTreeMap<String, Vec<f64>>,
}

/// Keeps metrics in memory, optionally forwarding to another collector.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    store: Mutex<Store>,
    forward: Option<TracingMetricsCollector>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit every metric through [`TracingMetricsCollector`].
    pub fn with_tracing() -> Self {
        Self { store: Mutex::default(), forward: Some(TracingMetricsCollector) }
    }

    /// Total of counter `name` across all label sets.
    pub fn counter(&self, name: &str) -> u64 {
        let labelled = format!("{name}{{");
        self.store
            .lock()
            .counters
            .iter()
            .filter(|(key, _)| key.as_str() == name || key.starts_with(&labelled))
            .map(|(_, value)| *value)
            .sum()
    }

    /// Value of counter `name` with exactly `labels`.
    pub fn counter_with(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.store.lock().counters.get(&render_key(name, labels)).copied().unwrap_or(0)
    }

    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.store.lock().gauges.get(&render_key(name, labels)).copied()
    }

    /// Recorded samples for histogram `name` with exactly `labels`.
    pub fn samples(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.store.lock().histograms.get(&render_key(name, labels)).cloned().unwrap_or_default()
    }

    /// All counters, keyed by rendered name.
    pub fn counters(&self) -> BTreeMap<String, u64> {
        self.store.lock().counters.clone()
    }
}

impl MetricsCollector for InMemoryMetrics {
    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        *self.store.lock().counters.entry(render_key(name, labels)).or_insert(0) += 1;
        if let Some(forward) = &self.forward {
            forward.increment_counter(name, labels);
        }
    }

    fn record_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.store.lock().gauges.insert(render_key(name, labels), value);
        if let Some(forward) = &self.forward {
            forward.record_gauge(name, value, labels);
        }
    }

    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.store.lock().histograms.entry(render_key(name, labels)).or_default().push(value);
        if let Some(forward) = &self.forward {
            forward.record_histogram(name, value, labels);
        }
    }
}

fn render_key(name: &str, labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let rendered: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{name}{{{}}}", rendered.join(","))
}
