//! Retry decorator for [`HttpTransport`]
//!
//! Each call to [`RetryingTransport::send`] gets its own attempt budget; two
//! logical calls in one sync (OAuth then PATCH) are retried independently.
//! A request whose URL does not parse fails with `InvalidUrl` without any
//! attempt.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pushsync_common::resilience::{RetryConfig, RetryExecutor};
use pushsync_domain::{PushSyncError, Result, RetrySettings};

use super::client::{HttpRequest, HttpTransport};

/// Build the exponential retry policy described by `settings`.
pub fn retry_config_from_settings(settings: &RetrySettings) -> Result<RetryConfig> {
    RetryConfig::builder()
        .max_retries(settings.max_retries)
        .exponential_backoff(
            Duration::from_secs(settings.initial_backoff_secs),
            2.0,
            Duration::from_secs(settings.max_backoff_secs),
        )
        .build()
        .map_err(|e| PushSyncError::Config(e.to_string()))
}

/// Transport that retries every failure of the inner transport.
#[derive(Clone)]
pub struct RetryingTransport {
    inner: Arc<dyn HttpTransport>,
    executor: RetryExecutor,
}

impl RetryingTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, config: RetryConfig) -> Self {
        Self { inner, executor: RetryExecutor::new(config) }
    }

    /// Wrap `inner` with the default policy: two retries after 1s and 2s.
    pub fn with_defaults(inner: Arc<dyn HttpTransport>) -> Self {
        Self::new(inner, RetryConfig::default())
    }

    pub fn config(&self) -> &RetryConfig {
        self.executor.config()
    }
}

impl std::fmt::Debug for RetryingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingTransport").field("config", self.executor.config()).finish()
    }
}

#[async_trait]
impl HttpTransport for RetryingTransport {
    async fn send(&self, request: &HttpRequest) -> Result<Vec<u8>> {
        request.validate()?;

        let inner = &self.inner;
        self.executor.execute(move || inner.send(request)).await
    }
}
