use std::time::Duration;

use async_trait::async_trait;
use pushsync_domain::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RESOURCE_TIMEOUT_SECS};
use pushsync_domain::{PushSyncError, Result, TransportConfig};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;
use url::Url;

use crate::errors::InfraError;

/// A fully formed request. Owned so the retry layer can send it repeatedly.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Overrides the client's overall timeout for this request.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), body: Vec::new(), timeout: None }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parse the request URL. Only absolute http(s) URLs with a host pass.
    ///
    /// A malformed endpoint is a construction error: callers check it before
    /// handing the request to a (retrying) transport.
    pub fn validate(&self) -> Result<Url> {
        parse_url(&self.url)
    }

    /// First value of header `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Sends one request and returns the raw response body.
///
/// Status codes >= 400 are errors (`PushSyncError::Http`); the body of a
/// failed response is discarded.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<Vec<u8>>;
}

/// Production transport backed by a shared reqwest client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default timeouts.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Transport using the timeouts from configuration.
    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        Self::builder()
            .request_timeout(config.request_timeout())
            .resource_timeout(config.resource_timeout())
            .build()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<Vec<u8>> {
        let url = request.validate()?;
        let method = request.method.clone();

        let mut builder = self.client.request(method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(%method, %url, "sending HTTP request");

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            PushSyncError::from(InfraError::from(err))
        })?;

        let status = response.status();
        debug!(%method, %url, %status, "received HTTP response");

        if status.as_u16() >= 400 {
            return Err(PushSyncError::Http { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|err| PushSyncError::from(InfraError::from(err)))?;
        Ok(body.to_vec())
    }
}

/// Parse and check a request URL before any network I/O.
fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| PushSyncError::InvalidUrl(format!("{raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(PushSyncError::InvalidUrl(format!("{raw}: not an http(s) URL"))),
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    request_timeout: Duration,
    resource_timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            resource_timeout: Duration::from_secs(DEFAULT_RESOURCE_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Connect and read timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bound on the whole exchange.
    pub fn resource_timeout(mut self, timeout: Duration) -> Self {
        self.resource_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = ReqwestClient::builder()
            .connect_timeout(self.request_timeout)
            .read_timeout(self.request_timeout)
            .timeout(self.resource_timeout)
            .no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| PushSyncError::from(InfraError::from(err)))?;

        Ok(ReqwestTransport { client })
    }
}
