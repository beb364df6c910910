//! Remote notification dispatch

pub mod service;

pub use service::PushDispatchService;
