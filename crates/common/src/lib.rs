//! Modular common utilities shared across pushsync crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: observability traits with no side effects
//! - `runtime`: async infrastructure (resilience)
//! - `observability`: tracing output from runtime modules

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod observability;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use observability::{MetricsCollector, NoOpMetricsCollector};
#[cfg(feature = "runtime")]
pub use resilience::{
    retry, BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryConfigError, RetryExecutor,
    RetryOutcome,
};
