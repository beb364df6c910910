//! Domain types and models

pub mod payload;
pub mod tokens;

pub use payload::{Alert, BackgroundCommand, PushAction};
pub use tokens::{AccessToken, DeviceToken, RegistrationToken};
