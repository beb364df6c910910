//! Platform adapters
//!
//! The native shim owns the OS push stack (APNs, FCM SDK, notification
//! center). It talks to the agent over newline-delimited JSON on the agent's
//! stdin/stdout; see [`host_bridge`]. Silent pushes run a local helper
//! executable through [`helper`].

pub mod helper;
pub mod host_bridge;

pub use helper::ProcessHelperLauncher;
pub use host_bridge::{parse_line, run_event_reader, HostBridge, HostCommand};
