//! Configuration loader
//!
//! Loads agent configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Uses environment variables when all credential variables are set;
//!    invalid values there are errors, not a reason to fall back
//! 2. Otherwise falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PUSHSYNC_TENANT_URL`: Tenant base URL (required)
//! - `PUSHSYNC_CLIENT_ID`: OAuth client id (required)
//! - `PUSHSYNC_CLIENT_SECRET`: OAuth client secret (required)
//! - `PUSHSYNC_APP_ID`: Backend application id (required)
//! - `PUSHSYNC_HELPER_PATH`: Helper executable; empty disables the helper
//! - `PUSHSYNC_REREGISTER_INTERVAL_SECS`: Forced re-registration period
//! - `PUSHSYNC_MAX_RETRIES`: Retries per HTTP call
//! - `PUSHSYNC_LOG_LEVEL`: Fallback log filter when `RUST_LOG` is unset
//! - `PUSHSYNC_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./pushsync.json` or `./pushsync.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use pushsync_domain::{AgentConfig, Credentials, PushSyncError, Result};

use crate::errors::InfraError;

/// Load configuration with automatic fallback strategy
///
/// When all four credential variables are set the environment is the source
/// and its parse or validation errors are returned as-is. Otherwise a config
/// file is searched for; if none is usable and the environment was partially
/// configured, the missing variable is reported.
///
/// # Errors
/// Returns `PushSyncError::Config` if:
/// - An environment variable has an invalid value
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or blank
pub fn load() -> Result<AgentConfig> {
    if CREDENTIAL_VARS.iter().all(|key| std::env::var_os(key).is_some()) {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!("Credential variables incomplete, trying config file");
    match load_from_file(None) {
        Ok(config) => Ok(config),
        Err(file_err) if CREDENTIAL_VARS.iter().any(|key| std::env::var_os(key).is_some()) => {
            tracing::debug!(error = %file_err, "No usable config file");
            load_from_env()
        }
        Err(file_err) => Err(file_err),
    }
}

const CREDENTIAL_VARS: [&str; 4] =
    ["PUSHSYNC_TENANT_URL", "PUSHSYNC_CLIENT_ID", "PUSHSYNC_CLIENT_SECRET", "PUSHSYNC_APP_ID"];

/// Load configuration from environment variables
///
/// The four credential variables must be present; everything else falls
/// back to defaults.
///
/// # Errors
/// Returns `PushSyncError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<AgentConfig> {
    let credentials = Credentials::new(
        env_var("PUSHSYNC_TENANT_URL")?,
        env_var("PUSHSYNC_CLIENT_ID")?,
        env_var("PUSHSYNC_CLIENT_SECRET")?,
        env_var("PUSHSYNC_APP_ID")?,
    );

    let mut config = AgentConfig::new(credentials);

    if let Ok(path) = std::env::var("PUSHSYNC_HELPER_PATH") {
        config.helper.enabled = !path.trim().is_empty();
        config.helper.path = path;
    }
    if let Some(interval) = env_parse::<u64>("PUSHSYNC_REREGISTER_INTERVAL_SECS")? {
        config.registration.reregister_interval_secs = interval;
    }
    if let Some(retries) = env_parse::<u32>("PUSHSYNC_MAX_RETRIES")? {
        config.retry.max_retries = retries;
    }
    if let Ok(level) = std::env::var("PUSHSYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("PUSHSYNC_LOG_JSON", config.logging.json);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches several locations for a config file.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PushSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<AgentConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PushSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => find_config_file().ok_or_else(|| {
            PushSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PushSyncError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `PushSyncError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<AgentConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| PushSyncError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PushSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PushSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn find_config_file() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("pushsync.json"),
        dir.join("pushsync.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        PushSyncError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PushSyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::Mutex;
    use tempfile::Builder;

    use super::*;

    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    const VARS: [&str; 9] = [
        "PUSHSYNC_TENANT_URL",
        "PUSHSYNC_CLIENT_ID",
        "PUSHSYNC_CLIENT_SECRET",
        "PUSHSYNC_APP_ID",
        "PUSHSYNC_HELPER_PATH",
        "PUSHSYNC_REREGISTER_INTERVAL_SECS",
        "PUSHSYNC_MAX_RETRIES",
        "PUSHSYNC_LOG_LEVEL",
        "PUSHSYNC_LOG_JSON",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn set_credentials() {
        std::env::set_var("PUSHSYNC_TENANT_URL", "https://tenant.example.com");
        std::env::set_var("PUSHSYNC_CLIENT_ID", "client");
        std::env::set_var("PUSHSYNC_CLIENT_SECRET", "secret");
        std::env::set_var("PUSHSYNC_APP_ID", "app-1");
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock();

        std::env::set_var("PUSHSYNC_TEST_BOOL_YES", "YES");
        std::env::set_var("PUSHSYNC_TEST_BOOL_OFF", "off");
        std::env::remove_var("PUSHSYNC_TEST_BOOL_MISSING");

        assert!(env_bool("PUSHSYNC_TEST_BOOL_YES", false));
        assert!(!env_bool("PUSHSYNC_TEST_BOOL_OFF", true));
        assert!(env_bool("PUSHSYNC_TEST_BOOL_MISSING", true));

        std::env::remove_var("PUSHSYNC_TEST_BOOL_YES");
        std::env::remove_var("PUSHSYNC_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_with_defaults() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        set_credentials();

        let config = load_from_env().expect("config from env");

        assert_eq!(config.credentials.tenant_url, "https://tenant.example.com");
        assert_eq!(config.credentials.app_id, "app-1");
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.registration.reregister_interval_secs, 4 * 60 * 60);
        assert!(config.helper.enabled);

        clear_env();
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        set_credentials();
        std::env::set_var("PUSHSYNC_HELPER_PATH", "");
        std::env::set_var("PUSHSYNC_REREGISTER_INTERVAL_SECS", "60");
        std::env::set_var("PUSHSYNC_MAX_RETRIES", "5");
        std::env::set_var("PUSHSYNC_LOG_LEVEL", "debug");
        std::env::set_var("PUSHSYNC_LOG_JSON", "true");

        let config = load_from_env().expect("config from env");

        assert!(!config.helper.enabled);
        assert_eq!(config.registration.reregister_interval_secs, 60);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var("PUSHSYNC_TENANT_URL", "https://tenant.example.com");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, PushSyncError::Config(msg) if msg.contains("PUSHSYNC_CLIENT_ID")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_blank_secret() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        set_credentials();
        std::env::set_var("PUSHSYNC_CLIENT_SECRET", "  ");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, PushSyncError::Config(msg) if msg.contains("client_secret")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        set_credentials();
        std::env::set_var("PUSHSYNC_MAX_RETRIES", "many");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, PushSyncError::Config(msg) if msg.contains("PUSHSYNC_MAX_RETRIES")));

        clear_env();
    }

    #[test]
    fn test_load_reports_invalid_optional_var_from_complete_env() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        set_credentials();
        std::env::set_var("PUSHSYNC_MAX_RETRIES", "abc");

        let err = load().unwrap_err();
        assert!(
            matches!(&err, PushSyncError::Config(msg) if msg.contains("PUSHSYNC_MAX_RETRIES")),
            "unexpected error: {err}"
        );

        clear_env();
    }

    #[test]
    fn test_load_reports_validation_failure_from_complete_env() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        set_credentials();
        std::env::set_var("PUSHSYNC_REREGISTER_INTERVAL_SECS", "0");

        let err = load().unwrap_err();
        assert!(
            matches!(&err, PushSyncError::Config(msg) if msg.contains("re-registration interval")),
            "unexpected error: {err}"
        );

        clear_env();
    }

    #[test]
    fn test_load_names_missing_var_from_partial_env() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var("PUSHSYNC_TENANT_URL", "https://tenant.example.com");
        std::env::set_var("PUSHSYNC_CLIENT_ID", "client");

        if find_config_file().is_none() {
            let err = load().unwrap_err();
            assert!(
                matches!(&err, PushSyncError::Config(msg) if msg.contains("PUSHSYNC_CLIENT_SECRET")),
                "unexpected error: {err}"
            );
        }

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "credentials": {
                "tenant_url": "https://tenant.example.com/",
                "client_id": "client",
                "client_secret": "secret",
                "app_id": "app-7"
            },
            "retry": { "max_retries": 3 }
        }"#;

        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).expect("json config");

        assert_eq!(config.credentials.app_id, "app-7");
        assert_eq!(config.credentials.tenant_base(), "https://tenant.example.com");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_backoff_secs, 10);
        assert_eq!(config.transport.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
            [credentials]
            tenant_url = "https://tenant.example.com"
            client_id = "client"
            client_secret = "secret"
            app_id = "app-8"

            [helper]
            enabled = false
            path = ""

            [logging]
            level = "warn"
            json = true
        "#;

        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).expect("toml config");

        assert_eq!(config.credentials.app_id, "app-8");
        assert!(!config.helper.enabled);
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_file_missing_credentials() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{ "retry": { "max_retries": 1 } }"#).unwrap();

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, PushSyncError::Config(_)));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, PushSyncError::Config(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_parse_config_unsupported_extension() {
        let err = parse_config("", Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, PushSyncError::Config(msg) if msg.contains("yaml")));
    }

    #[test]
    fn test_parse_config_invalid_toml() {
        let err = parse_config("credentials = [", Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, PushSyncError::Config(msg) if msg.contains("TOML")));
    }
}
