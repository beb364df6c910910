//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for pushsync
///
/// `InvalidUrl`, `InvalidTokenResponse` and `Http` make up the sync
/// pipeline's taxonomy; the remaining variants cover transport, configuration
/// and host integration failures around it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PushSyncError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("HTTP error: {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PushSyncError {
    /// Stable label suitable for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidTokenResponse(_) => "invalid_token_response",
            Self::Http { .. } => "http",
            Self::Network(_) => "network",
            Self::Config(_) => "config",
            Self::Platform(_) => "platform",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for pushsync operations
pub type Result<T> = std::result::Result<T, PushSyncError>;
