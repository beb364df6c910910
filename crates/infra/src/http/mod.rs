//! HTTP transport
//!
//! [`HttpTransport`] is the seam every backend call goes through:
//! [`ReqwestTransport`] talks to the network and [`RetryingTransport`] adds
//! the bounded retry policy on top.

pub mod client;
pub mod retry;

pub use client::{HttpRequest, HttpTransport, ReqwestTransport, ReqwestTransportBuilder};
pub use retry::{retry_config_from_settings, RetryingTransport};
