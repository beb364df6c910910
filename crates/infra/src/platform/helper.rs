//! Local helper process launcher

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pushsync_core::HelperLauncher;
use pushsync_domain::{BackgroundCommand, PushSyncError, Result};
use tokio::process::Command;
use tracing::{info, instrument, warn};

use crate::errors::InfraError;

/// Runs the helper executable with the command kind as its only argument.
#[derive(Debug, Clone)]
pub struct ProcessHelperLauncher {
    path: PathBuf,
}

impl ProcessHelperLauncher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HelperLauncher for ProcessHelperLauncher {
    #[instrument(skip(self, command), fields(path = %self.path.display(), kind = %command.kind))]
    async fn launch(&self, command: &BackgroundCommand) -> Result<()> {
        let status = Command::new(&self.path)
            .arg(&command.kind)
            .stdin(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to start helper");
                PushSyncError::from(InfraError::from(e))
            })?;

        if status.success() {
            info!(%status, "Helper exited");
        } else {
            warn!(%status, "Helper exited with failure status");
        }

        Ok(())
    }
}
