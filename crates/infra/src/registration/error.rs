//! Controller error types

use pushsync_domain::PushSyncError;
use thiserror::Error;

use crate::errors::InfraError;

/// Lifecycle errors of the registration controller
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Controller is already running
    #[error("Registration controller already running")]
    AlreadyRunning,

    /// Controller is not running
    #[error("Registration controller not running")]
    NotRunning,

    /// The event receiver was lost with a failed task
    #[error("Registration event channel is gone")]
    ChannelUnavailable,

    /// Stopping timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

/// Result alias for controller lifecycle operations
pub type ControllerResult<T> = Result<T, ControllerError>;

impl From<ControllerError> for InfraError {
    fn from(err: ControllerError) -> Self {
        InfraError(PushSyncError::Internal(err.to_string()))
    }
}

impl From<ControllerError> for PushSyncError {
    fn from(err: ControllerError) -> Self {
        InfraError::from(err).into()
    }
}
