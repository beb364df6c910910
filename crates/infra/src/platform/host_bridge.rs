//! JSON-lines bridge to the native host
//!
//! Inbound lines carry platform callbacks tagged by `"event"`:
//!
//! ```text
//! {"event":"authorization","granted":true}
//! {"event":"apns_token","token_hex":"0a1b..."}
//! {"event":"fcm_token","token":"..."}
//! {"event":"remote_notification","payload":{"aps":{...}}}
//! ```
//!
//! Outbound lines are registrar commands such as `{"command":"register"}`.

use async_trait::async_trait;
use pushsync_core::{EventSender, RegistrationEvent, RemoteNotificationRegistrar};
use pushsync_domain::{DeviceToken, PushSyncError, RegistrationToken, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::InfraError;

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HostEvent {
    Authorization {
        granted: bool,
        #[serde(default)]
        error: Option<String>,
    },
    ApnsToken {
        token_hex: String,
    },
    RegistrationFailed {
        reason: String,
    },
    FcmToken {
        #[serde(default)]
        token: Option<String>,
    },
    RemoteNotification {
        payload: Value,
    },
    NotificationPresented {
        payload: Value,
    },
    NotificationOpened {
        payload: Value,
    },
}

/// Parse one inbound line.
///
/// Returns `Ok(None)` for blank lines and for token refreshes without a
/// usable token.
///
/// # Errors
///
/// `Platform` when the line is not a known event.
pub fn parse_line(line: &str) -> Result<Option<RegistrationEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let event: HostEvent = serde_json::from_str(line)
        .map_err(|e| PushSyncError::Platform(format!("malformed host event: {e}")))?;

    let event = match event {
        HostEvent::Authorization { error: Some(reason), .. } => {
            RegistrationEvent::AuthorizationFailed { reason }
        }
        HostEvent::Authorization { granted, error: None } => {
            RegistrationEvent::AuthorizationResolved { granted }
        }
        HostEvent::ApnsToken { token_hex } => {
            RegistrationEvent::DeviceTokenRegistered(DeviceToken::from_hex(&token_hex)?)
        }
        HostEvent::RegistrationFailed { reason } => RegistrationEvent::RegistrationFailed { reason },
        HostEvent::FcmToken { token } => match token.map(RegistrationToken::new) {
            Some(Ok(token)) => RegistrationEvent::RegistrationTokenReceived(token),
            _ => {
                debug!("Token refresh without a token, dropping");
                return Ok(None);
            }
        },
        HostEvent::RemoteNotification { payload } => RegistrationEvent::RemoteNotification(payload),
        HostEvent::NotificationPresented { payload } => {
            RegistrationEvent::NotificationPresented(payload)
        }
        HostEvent::NotificationOpened { payload } => RegistrationEvent::NotificationOpened(payload),
    };

    Ok(Some(event))
}

/// Forward host events from `reader` into `sender` until EOF, cancellation,
/// or the receiver going away. Malformed lines are logged and skipped.
///
/// Returns the number of events forwarded.
pub async fn run_event_reader<R>(
    reader: R,
    sender: EventSender,
    cancel: CancellationToken,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0usize;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Host event reader cancelled");
                break;
            }
            line = lines.next_line() => line.map_err(|e| PushSyncError::from(InfraError::from(e)))?,
        };

        let Some(line) = line else {
            info!("Host closed the event stream");
            break;
        };

        match parse_line(&line) {
            Ok(Some(event)) => {
                debug!(event = event.name(), "Host event received");
                if !sender.send(event) {
                    debug!("Event receiver dropped, stopping reader");
                    break;
                }
                forwarded += 1;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Skipping host event line"),
        }
    }

    Ok(forwarded)
}

/// Commands written to the host, one JSON object per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    RequestAuthorization,
    Register,
    Unregister,
}

/// Registrar that asks the native host to act on the push stack.
pub struct HostBridge<W> {
    writer: Mutex<W>,
}

impl<W> HostBridge<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    /// Write one command line and flush.
    pub async fn send_command(&self, command: HostCommand) -> Result<()> {
        let mut line = serde_json::to_vec(&command).map_err(|e| PushSyncError::from(InfraError::from(e)))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await.map_err(|e| PushSyncError::from(InfraError::from(e)))?;
        writer.flush().await.map_err(|e| PushSyncError::from(InfraError::from(e)))?;

        debug!(?command, "Host command sent");
        Ok(())
    }
}

#[async_trait]
impl<W> RemoteNotificationRegistrar for HostBridge<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn request_authorization(&self) -> Result<()> {
        self.send_command(HostCommand::RequestAuthorization).await
    }

    async fn register(&self) -> Result<()> {
        self.send_command(HostCommand::Register).await
    }

    async fn unregister(&self) -> Result<()> {
        self.send_command(HostCommand::Unregister).await
    }
}
