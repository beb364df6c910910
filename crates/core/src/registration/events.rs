//! Typed registration events
//!
//! The platform reports authorization results, tokens and deliveries through
//! callbacks on arbitrary threads. Each callback becomes a
//! [`RegistrationEvent`] pushed into an unbounded channel; the lifecycle
//! controller is the single consumer.

use pushsync_domain::{DeviceToken, RegistrationToken};
use serde_json::Value;
use tokio::sync::mpsc;

/// Callback from the platform push stack or the push SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationEvent {
    /// User answered the notification permission prompt.
    AuthorizationResolved { granted: bool },
    /// The permission request itself failed.
    AuthorizationFailed { reason: String },
    /// APNs issued a device token.
    DeviceTokenRegistered(DeviceToken),
    /// APNs registration failed; a fresh registration is forced.
    RegistrationFailed { reason: String },
    /// The push SDK issued or refreshed the registration token.
    RegistrationTokenReceived(RegistrationToken),
    /// Remote notification delivered to the app.
    RemoteNotification(Value),
    /// Notification arrived while the app was in the foreground.
    NotificationPresented(Value),
    /// User clicked a notification.
    NotificationOpened(Value),
}

impl RegistrationEvent {
    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthorizationResolved { .. } => "authorization_resolved",
            Self::AuthorizationFailed { .. } => "authorization_failed",
            Self::DeviceTokenRegistered(_) => "device_token_registered",
            Self::RegistrationFailed { .. } => "registration_failed",
            Self::RegistrationTokenReceived(_) => "registration_token_received",
            Self::RemoteNotification(_) => "remote_notification",
            Self::NotificationPresented(_) => "notification_presented",
            Self::NotificationOpened(_) => "notification_opened",
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer half; cheap to clone and callable from non-async threads.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<RegistrationEvent>,
}

impl EventSender {
    /// Queue an event. Returns `false` once the receiver is gone.
    pub fn send(&self, event: RegistrationEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Forward a token refresh from the push SDK.
    ///
    /// The SDK may report a missing or empty token; those are dropped and
    /// nothing is queued.
    pub fn token_refreshed(&self, token: Option<&str>) -> bool {
        match token.map(RegistrationToken::new) {
            Some(Ok(token)) => self.send(RegistrationEvent::RegistrationTokenReceived(token)),
            _ => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the lifecycle controller.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<RegistrationEvent>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<RegistrationEvent> {
        self.rx.recv().await
    }
}
