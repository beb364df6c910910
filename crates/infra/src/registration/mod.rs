//! Registration lifecycle
//!
//! [`RegistrationController`] consumes platform events, keeps the push
//! registration alive and hands new tokens to the sync service.

pub mod controller;
pub mod error;

pub use controller::RegistrationController;
pub use error::{ControllerError, ControllerResult};
