//! OAuth client-credentials token fetch
//!
//! Tokens are short-lived and fetched fresh for every sync; nothing is cached
//! or persisted.

use std::sync::Arc;

use async_trait::async_trait;
use pushsync_core::AccessTokenProvider;
use pushsync_domain::constants::{
    APPLICATION_JSON, FORM_URLENCODED, GRANT_TYPE_CLIENT_CREDENTIALS, OAUTH_TOKEN_PATH,
};
use pushsync_domain::{AccessToken, Credentials, PushSyncError, Result};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::http::{HttpRequest, HttpTransport};

/// Fetches bearer tokens with the client-credentials grant.
pub struct ClientCredentialsFetcher {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<Credentials>,
}

impl ClientCredentialsFetcher {
    /// `transport` should already apply the retry policy.
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Arc<Credentials>) -> Self {
        Self { transport, credentials }
    }

    /// POST the grant to `{tenant_url}/api/oauth2/v1/token` and return the
    /// `access_token` field of the response.
    ///
    /// # Errors
    ///
    /// `InvalidTokenResponse` when the body is not a JSON object with a
    /// string `access_token`; transport errors propagate unchanged.
    #[instrument(skip(self, client_secret))]
    pub async fn fetch_access_token(
        &self,
        tenant_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken> {
        let url = format!("{}{}", tenant_url.trim_end_matches('/'), OAUTH_TOKEN_PATH);
        let body = format!(
            "grant_type={}&client_id={}&client_secret={}",
            GRANT_TYPE_CLIENT_CREDENTIALS,
            urlencoding::encode(client_id),
            urlencoding::encode(client_secret),
        );

        let request = HttpRequest::new(Method::POST, url)
            .header("Content-Type", FORM_URLENCODED)
            .header("Accept", APPLICATION_JSON)
            .body(body);
        request.validate()?;

        let response = self.transport.send(&request).await?;
        let token = parse_token_response(&response)?;

        debug!("Access token obtained");
        Ok(token)
    }
}

#[async_trait]
impl AccessTokenProvider for ClientCredentialsFetcher {
    async fn access_token(&self) -> Result<AccessToken> {
        let credentials = &self.credentials;
        self.fetch_access_token(
            &credentials.tenant_url,
            &credentials.client_id,
            &credentials.client_secret,
        )
        .await
    }
}

fn parse_token_response(body: &[u8]) -> Result<AccessToken> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        PushSyncError::InvalidTokenResponse(format!("response is not valid JSON: {e}"))
    })?;

    let object = value.as_object().ok_or_else(|| {
        PushSyncError::InvalidTokenResponse("response is not a JSON object".into())
    })?;

    object
        .get("access_token")
        .and_then(Value::as_str)
        .map(AccessToken::new)
        .ok_or_else(|| PushSyncError::InvalidTokenResponse("missing string access_token".into()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::ReqwestTransport;

    fn fetcher(tenant: &str) -> ClientCredentialsFetcher {
        let credentials = Arc::new(Credentials::new(tenant, "agent id", "s3cr&t=", "app-1"));
        ClientCredentialsFetcher::new(Arc::new(ReqwestTransport::new().unwrap()), credentials)
    }

    #[tokio::test]
    async fn posts_form_encoded_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth2/v1/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(header("accept", "application/json"))
            .and(body_string(
                "grant_type=client_credentials&client_id=agent%20id&client_secret=s3cr%26t%3D",
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "abc123", "expires_in": 300 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = fetcher(&server.uri()).access_token().await.unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[tokio::test]
    async fn trailing_slash_on_tenant_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth2/v1/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "t" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tenant = format!("{}/", server.uri());
        assert!(fetcher(&tenant).access_token().await.is_ok());
    }

    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn send(&self, _request: &HttpRequest) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PushSyncError::Network("offline".into()))
        }
    }

    #[tokio::test]
    async fn unparseable_tenant_is_invalid_url() {
        let err = fetcher("not a url").access_token().await.unwrap_err();
        assert!(matches!(err, PushSyncError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn unparseable_tenant_never_reaches_the_transport() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(Credentials::new("::nope::", "id", "secret", "app-1"));
        let fetcher = ClientCredentialsFetcher::new(transport.clone(), credentials);

        let err = fetcher.access_token().await.unwrap_err();

        assert!(matches!(err, PushSyncError::InvalidUrl(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn error_status_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = fetcher(&server.uri()).access_token().await.unwrap_err();
        assert_eq!(err, PushSyncError::Http { status: 403 });
    }

    #[test]
    fn token_response_shapes() {
        assert_eq!(
            parse_token_response(br#"{"access_token":"abc"}"#).unwrap().as_str(),
            "abc"
        );

        for body in [
            &b"not json"[..],
            br#"["access_token"]"#,
            br#"{"token_type":"bearer"}"#,
            br#"{"access_token":42}"#,
            br#"{"access_token":null}"#,
            b"",
        ] {
            let err = parse_token_response(body).unwrap_err();
            assert!(
                matches!(err, PushSyncError::InvalidTokenResponse(_)),
                "{:?} gave {err:?}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
