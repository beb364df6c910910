//! # pushsync Domain
//!
//! Business domain types and models for the push registration agent.
//!
//! This crate contains:
//! - Token types (registration, access, APNs device tokens)
//! - Remote notification payload classification
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants (endpoints, content types, defaults)
//!
//! ## Architecture
//! - No dependencies on other pushsync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
