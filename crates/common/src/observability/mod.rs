//! Observability primitives
//!
//! Trait abstractions that let components emit metrics without depending on
//! a concrete collector. Implementations live in `pushsync-infra`.

pub mod traits;

// Re-export trait abstractions
pub use traits::{MetricsCollector, NoOpMetricsCollector};
