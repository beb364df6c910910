//! Port interfaces for sync operations

use async_trait::async_trait;
use pushsync_domain::{AccessToken, RegistrationToken, Result};

/// Trait for obtaining bearer tokens for backend calls
///
/// Implementations fetch a fresh token on every call; nothing is cached
/// between syncs.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Fetch a new access token
    async fn access_token(&self) -> Result<AccessToken>;
}

/// Trait for reporting a push registration token to the backend
#[async_trait]
pub trait PushTokenSync: Send + Sync {
    /// Authenticate and store `token` for this application.
    ///
    /// Succeeds only when the backend accepted the update; errors from any
    /// step are returned unchanged.
    async fn sync_push_token(&self, token: &RegistrationToken) -> Result<()>;
}
