//! Shared helpers for infra integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use pushsync_common::RetryConfig;
use pushsync_domain::Credentials;
use pushsync_infra::api::{ClientCredentialsFetcher, TokenSyncService};
use pushsync_infra::http::{HttpTransport, ReqwestTransport, RetryingTransport};

pub const CLIENT_ID: &str = "desktop-agent";
pub const CLIENT_SECRET: &str = "s3cret";
pub const APP_ID: &str = "app-42";

pub fn credentials(tenant: &str) -> Arc<Credentials> {
    Arc::new(Credentials::new(tenant, CLIENT_ID, CLIENT_SECRET, APP_ID))
}

/// Same attempt budget as production, without the real-time backoff.
pub fn fast_retry() -> RetryConfig {
    RetryConfig::builder().max_retries(2).fixed_backoff(Duration::ZERO).build().expect("retry config")
}

pub fn retrying_reqwest() -> Arc<dyn HttpTransport> {
    let inner = Arc::new(ReqwestTransport::new().expect("transport"));
    Arc::new(RetryingTransport::new(inner, fast_retry()))
}

/// Fetcher and sync service wired the way the agent wires them.
pub fn sync_service(tenant: &str, transport: Arc<dyn HttpTransport>) -> TokenSyncService {
    let credentials = credentials(tenant);
    let fetcher =
        Arc::new(ClientCredentialsFetcher::new(Arc::clone(&transport), Arc::clone(&credentials)));
    TokenSyncService::new(fetcher, transport, credentials)
}
