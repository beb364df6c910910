//! Resilience patterns for fault tolerance
//!
//! This module provides a **generic, reusable** retry executor with bounded
//! exponential backoff. It is generic over the operation's error type and
//! returns the operation's last error unchanged once the retry budget is
//! spent, so callers keep their own error taxonomy.
//!
//! Delays are computed without jitter and slept with `tokio::time::sleep`,
//! which suspends only the calling task. Tests can drive the executor under
//! `tokio::time::pause()` to assert exact delays.

pub mod retry;

// Re-export retry types
pub use retry::{
    retry, BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryConfigError, RetryExecutor,
    RetryOutcome,
};
