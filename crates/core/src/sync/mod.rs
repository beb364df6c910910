//! Token sync operations
//!
//! Ports for turning a push registration token into an authenticated backend
//! update.

pub mod ports;

pub use ports::{AccessTokenProvider, PushTokenSync};
