//! Application constants
//!
//! Centralized location for the endpoint paths, media types and defaults the
//! agent relies on.

// Backend endpoints (appended to the tenant URL)
pub const OAUTH_TOKEN_PATH: &str = "/api/oauth2/v1/token";
pub const DESKTOP_LOGIN_APPS_PATH: &str = "/api/desktoplogin/apps";

// Media types
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const APPLICATION_JSON: &str = "application/json";
pub const APP_UPDATE_CONTENT_TYPE: &str = "application/vnd.dvmi.desktop.login.app.update.request+json";
pub const ACCEPT_ANY: &str = "*/*";

// OAuth
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

// Transport defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RESOURCE_TIMEOUT_SECS: u64 = 60;

// Retry defaults: delays of 1s, 2s, ... capped at 10s
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 1;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 10;

// Registration lifecycle
pub const DEFAULT_REREGISTER_INTERVAL_SECS: u64 = 4 * 60 * 60;
pub const DEFAULT_REREGISTER_DELAY_MS: u64 = 1_000;

// Local helper
pub const DEFAULT_HELPER_PATH: &str = "/Applications/idemeum MFA.app/Contents/MacOS/idemeum MFA";

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Number of leading characters of a token kept when logging it.
pub const TOKEN_LOG_PREFIX_LEN: usize = 8;
