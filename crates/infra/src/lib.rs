//! # pushsync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - HTTP transport (reqwest) with the bounded retry policy
//! - Backend API client (OAuth client-credentials, token sync)
//! - Configuration loading (environment, JSON/TOML files)
//! - Platform adapters (host bridge over stdio, helper process)
//! - Registration lifecycle controller
//! - Logging setup and metrics collectors
//!
//! ## Architecture
//! - Implements traits defined in `pushsync-core`
//! - Depends on `pushsync-common`, `pushsync-domain` and `pushsync-core`
//! - Contains all "impure" code (I/O, processes, timers)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod platform;
pub mod registration;

// Re-export commonly used items
pub use api::{ClientCredentialsFetcher, TokenSyncService};
pub use errors::InfraError;
pub use http::{HttpRequest, HttpTransport, ReqwestTransport, RetryingTransport};
pub use observability::{InMemoryMetrics, TracingMetricsCollector};
pub use platform::{HostBridge, ProcessHelperLauncher};
pub use registration::{ControllerError, RegistrationController};
