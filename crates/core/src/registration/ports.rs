//! Port interfaces for the platform side of registration
//!
//! These traits define the boundaries between the lifecycle controller and
//! the OS push stack or the local helper process.

use async_trait::async_trait;
use pushsync_domain::{BackgroundCommand, Result};

/// Commands the agent issues to the platform push stack
///
/// Each call only asks for the action; outcomes come back asynchronously as
/// registration events.
#[async_trait]
pub trait RemoteNotificationRegistrar: Send + Sync {
    /// Ask the user to allow alerts, sounds and badges
    async fn request_authorization(&self) -> Result<()>;

    /// Register for remote notifications
    async fn register(&self) -> Result<()>;

    /// Unregister from remote notifications
    async fn unregister(&self) -> Result<()>;
}

/// Trait for running the local helper on behalf of a silent push
#[async_trait]
pub trait HelperLauncher: Send + Sync {
    /// Run the helper for `command` and wait for it to exit
    async fn launch(&self, command: &BackgroundCommand) -> Result<()>;
}
