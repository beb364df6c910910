//! Global `tracing` subscriber setup
//!
//! Output goes to stderr: stdout is reserved for host bridge commands.

use pushsync_domain::constants::DEFAULT_LOG_LEVEL;
use pushsync_domain::{LoggingConfig, PushSyncError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            PushSyncError::Config(format!("Invalid log level '{}': {e}", config.level))
        }),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true).with_writer(std::io::stderr)).try_init()
    };

    result.map_err(|e| PushSyncError::Internal(format!("Failed to initialise logging: {e}")))
}

/// Run `f` under a temporary stderr subscriber at the default level.
///
/// Startup work that runs before [`init`] (reading `.env` and config) logs
/// through this subscriber instead of being dropped.
pub fn with_bootstrap_subscriber<T>(f: impl FnOnce() -> T) -> T {
    let filter = build_filter(&LoggingConfig::default())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr));

    tracing::subscriber::with_default(subscriber, f)
}
