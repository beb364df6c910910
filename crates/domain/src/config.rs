//! Configuration management
//!
//! `AgentConfig` is built once at startup and handed to each component
//! constructor. Only the credentials are required; every other section has a
//! default.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HELPER_PATH, DEFAULT_INITIAL_BACKOFF_SECS, DEFAULT_LOG_LEVEL, DEFAULT_MAX_BACKOFF_SECS,
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_REREGISTER_DELAY_MS,
    DEFAULT_REREGISTER_INTERVAL_SECS, DEFAULT_RESOURCE_TIMEOUT_SECS,
};
use crate::errors::{PushSyncError, Result};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub credentials: Credentials,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub helper: HelperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgentConfig {
    /// Configuration with the given credentials and defaults everywhere else.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            transport: TransportConfig::default(),
            retry: RetrySettings::default(),
            registration: RegistrationConfig::default(),
            helper: HelperConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Check that required values are present and intervals are usable.
    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;

        if self.transport.request_timeout_secs == 0 || self.transport.resource_timeout_secs == 0 {
            return Err(PushSyncError::Config("transport timeouts must be non-zero".into()));
        }
        if self.registration.reregister_interval_secs == 0 {
            return Err(PushSyncError::Config("re-registration interval must be non-zero".into()));
        }
        if self.helper.enabled && self.helper.path.trim().is_empty() {
            return Err(PushSyncError::Config("helper path is empty".into()));
        }

        Ok(())
    }
}

/// OAuth client credentials and the backend application they update.
///
/// Loaded once and never mutated. The secret is not serialized and is
/// redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub tenant_url: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub app_id: String,
}

impl Credentials {
    pub fn new(
        tenant_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_url: tenant_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            app_id: app_id.into(),
        }
    }

    /// Fails with `Config` when any field is blank.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("tenant_url", &self.tenant_url),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("app_id", &self.app_id),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(PushSyncError::Config(format!("credential '{name}' is empty")));
            }
        }

        Ok(())
    }

    /// Tenant URL without trailing slashes, ready for path concatenation.
    pub fn tenant_base(&self) -> &str {
        self.tenant_url.trim_end_matches('/')
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_url", &self.tenant_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// HTTP transport timeouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connect/read timeout and default per-request timeout.
    pub request_timeout_secs: u64,
    /// Upper bound for a whole request/response exchange.
    pub resource_timeout_secs: u64,
}

impl TransportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resource_timeout(&self) -> Duration {
        Duration::from_secs(self.resource_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            resource_timeout_secs: DEFAULT_RESOURCE_TIMEOUT_SECS,
        }
    }
}

/// Retry settings applied to every backend HTTP call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_secs: DEFAULT_INITIAL_BACKOFF_SECS,
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
        }
    }
}

/// Remote notification registration lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Period of the forced re-registration timer.
    pub reregister_interval_secs: u64,
    /// Pause between unregistering and registering again.
    pub reregister_delay_ms: u64,
}

impl RegistrationConfig {
    pub fn reregister_interval(&self) -> Duration {
        Duration::from_secs(self.reregister_interval_secs)
    }

    pub fn reregister_delay(&self) -> Duration {
        Duration::from_millis(self.reregister_delay_ms)
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            reregister_interval_secs: DEFAULT_REREGISTER_INTERVAL_SECS,
            reregister_delay_ms: DEFAULT_REREGISTER_DELAY_MS,
        }
    }
}

/// Local helper launched for background pushes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self { enabled: true, path: DEFAULT_HELPER_PATH.to_string() }
    }
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
