//! Push dispatch service
//!
//! Turns a delivered payload into an action: silent pushes run the local
//! helper, alerts are logged.

use std::sync::Arc;

use pushsync_domain::{PushAction, Result};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::registration::ports::HelperLauncher;

/// Routes remote notifications to the local helper.
#[derive(Clone)]
pub struct PushDispatchService {
    launcher: Option<Arc<dyn HelperLauncher>>,
}

impl PushDispatchService {
    /// Create a service that runs background commands through `launcher`.
    pub fn new(launcher: Arc<dyn HelperLauncher>) -> Self {
        Self { launcher: Some(launcher) }
    }

    /// Create a service with the helper disabled; background commands are
    /// logged and skipped.
    pub fn without_helper() -> Self {
        Self { launcher: None }
    }

    pub fn helper_enabled(&self) -> bool {
        self.launcher.is_some()
    }

    /// Classify `payload` and act on it.
    ///
    /// Returns the action taken. Helper launch failures are logged and
    /// returned.
    #[instrument(skip(self, payload))]
    pub async fn dispatch(&self, payload: &Value) -> Result<PushAction> {
        let action = PushAction::classify(payload);

        match &action {
            PushAction::Background(command) => match &self.launcher {
                Some(launcher) => {
                    info!(kind = %command.kind, user = %command.user, "Launching helper for silent push");
                    if let Err(e) = launcher.launch(command).await {
                        warn!(kind = %command.kind, error = %e, "Helper launch failed");
                        return Err(e);
                    }
                }
                None => {
                    info!(kind = %command.kind, "Helper disabled, skipping background command");
                }
            },
            PushAction::BackgroundWithoutData => {
                info!("Silent push without data");
            }
            PushAction::Alert(alert) => {
                info!(title = %alert.title, body = %alert.body, "Alert notification received");
            }
            PushAction::Ignored => {
                info!("Remote notification without actionable content");
            }
        }

        Ok(action)
    }
}

impl std::fmt::Debug for PushDispatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushDispatchService").field("helper_enabled", &self.helper_enabled()).finish()
    }
}
