//! Remote notification registration
//!
//! Platform callbacks (authorization results, APNs/FCM tokens, deliveries)
//! are handed to the agent as [`RegistrationEvent`]s over a channel; the
//! agent drives the platform back through [`RemoteNotificationRegistrar`].

pub mod events;
pub mod ports;

pub use events::{event_channel, EventReceiver, EventSender, RegistrationEvent};
pub use ports::{HelperLauncher, RemoteNotificationRegistrar};
