//! Observability infrastructure for logging and metrics
//!
//! - [`logging::init`] installs the global `tracing` subscriber.
//! - [`TracingMetricsCollector`] emits metrics as `tracing` events.
//! - [`InMemoryMetrics`] keeps counters in memory for shutdown summaries and
//!   tests.
//!
//! Both collectors implement
//! [`MetricsCollector`](pushsync_common::MetricsCollector).

pub mod logging;
pub mod metrics;

pub use metrics::{InMemoryMetrics, TracingMetricsCollector};
