//! # pushsync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for token sync, OAuth, registration and
//!   the local helper
//! - The typed registration event channel fed by platform callbacks
//! - Use cases and services (push payload dispatch)
//!
//! ## Architecture Principles
//! - Only depends on `pushsync-domain`
//! - No HTTP, process or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod dispatch;
pub mod registration;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use dispatch::PushDispatchService;
pub use registration::events::{event_channel, EventReceiver, EventSender, RegistrationEvent};
pub use registration::ports::{HelperLauncher, RemoteNotificationRegistrar};
pub use sync::ports::{AccessTokenProvider, PushTokenSync};
