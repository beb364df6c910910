//! Push registration token sync
//!
//! One sync is a fresh OAuth grant followed by a PATCH of the application
//! record. The PATCH is never sent without a token from the same sync.

use std::sync::Arc;

use async_trait::async_trait;
use pushsync_core::{AccessTokenProvider, PushTokenSync};
use pushsync_domain::constants::{ACCEPT_ANY, APP_UPDATE_CONTENT_TYPE, DESKTOP_LOGIN_APPS_PATH};
use pushsync_domain::{Credentials, PushSyncError, RegistrationToken, Result};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use crate::errors::InfraError;
use crate::http::{HttpRequest, HttpTransport};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppUpdateRequest<'a> {
    fcm_registration_token: &'a str,
}

/// Reports registration tokens to the desktop-login backend.
pub struct TokenSyncService {
    tokens: Arc<dyn AccessTokenProvider>,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<Credentials>,
}

impl TokenSyncService {
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<Credentials>,
    ) -> Self {
        Self { tokens, transport, credentials }
    }

    fn app_url(&self) -> String {
        format!(
            "{}{}/{}",
            self.credentials.tenant_base(),
            DESKTOP_LOGIN_APPS_PATH,
            urlencoding::encode(&self.credentials.app_id)
        )
    }
}

#[async_trait]
impl PushTokenSync for TokenSyncService {
    #[instrument(skip(self, token), fields(token = %token.redacted(), app_id = %self.credentials.app_id))]
    async fn sync_push_token(&self, token: &RegistrationToken) -> Result<()> {
        let app_url = self.app_url();
        HttpRequest::new(Method::PATCH, app_url.as_str()).validate()?;

        let access_token = self.tokens.access_token().await?;

        let body = serde_json::to_vec(&AppUpdateRequest { fcm_registration_token: token.as_str() })
            .map_err(|e| PushSyncError::from(InfraError::from(e)))?;

        let request = HttpRequest::new(Method::PATCH, app_url)
            .header("Authorization", access_token.bearer_header())
            .header("Content-Type", APP_UPDATE_CONTENT_TYPE)
            .header("Accept", ACCEPT_ANY)
            .body(body);

        // Response body carries nothing we need.
        let _ = self.transport.send(&request).await?;

        info!("Registration token synced");
        Ok(())
    }
}
