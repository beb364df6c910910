//! # pushsync Agent
//!
//! Application layer - wiring and process entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - The run loop that connects the host bridge to the registration
//!   controller
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;

// Re-export for convenience
pub use context::*;
