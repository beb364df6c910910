//! Conversions from external infrastructure errors into domain errors.

use pushsync_domain::PushSyncError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PushSyncError);

impl From<InfraError> for PushSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PushSyncError> for InfraError {
    fn from(value: PushSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPushSyncError {
    fn into_pushsync(self) -> PushSyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PushSyncError */
/* -------------------------------------------------------------------------- */

impl IntoPushSyncError for HttpError {
    fn into_pushsync(self) -> PushSyncError {
        if let Some(status) = self.status() {
            return PushSyncError::Http { status: status.as_u16() };
        }

        if self.is_timeout() {
            return PushSyncError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return PushSyncError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return PushSyncError::Internal(format!("failed to build HTTP request: {self}"));
        }

        PushSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_pushsync())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → PushSyncError */
/* -------------------------------------------------------------------------- */

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(PushSyncError::InvalidUrl(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* serde / io / toml → PushSyncError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(PushSyncError::Internal(format!("JSON error: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(PushSyncError::Platform(format!("I/O error: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(PushSyncError::Config(format!("Invalid TOML format: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
