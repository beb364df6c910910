//! Backend API client for the desktop-login service
//!
//! Two calls make up one token sync: an OAuth client-credentials grant and a
//! PATCH of the application's push registration token. Both go through the
//! retrying [`HttpTransport`](crate::http::HttpTransport).

pub mod auth;
pub mod token_sync;

pub use auth::ClientCredentialsFetcher;
pub use token_sync::TokenSyncService;
