//! pushsync agent - push token sync and background notification dispatch
//!
//! Reads host events from stdin and writes registrar commands to stdout.

use std::process::ExitCode;

use anyhow::Context;
use pushsync_agent::AppContext;
use pushsync_domain::AgentConfig;
use pushsync_infra::config;
use pushsync_infra::observability::logging;
use tokio::io::BufReader;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // .env has to be applied before the environment is read for config.
    // Both run before the configured subscriber exists.
    let loaded = logging::with_bootstrap_subscriber(|| {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded .env from: {:?}", path),
            Err(e) => warn!("Could not load .env file: {}", e),
        }

        let config = config::load();
        if let Err(e) = &config {
            error!(error = %e, "Failed to load configuration");
        }
        config
    });

    let Ok(config) = loaded else {
        return ExitCode::FAILURE;
    };

    if let Err(e) = logging::init(&config.logging) {
        logging::with_bootstrap_subscriber(|| error!(error = %e, "Failed to install logging"));
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "pushsync agent failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AgentConfig) -> anyhow::Result<()> {
    info!("pushsync agent starting...");

    let ctx = AppContext::new_with_config(config).context("failed to build application context")?;
    ctx.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown_signal())
        .await
        .context("agent stopped with an error")?;

    info!("pushsync agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
