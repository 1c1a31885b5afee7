//! HTTP GET with the server's `Retry-After` throttling contract.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use riven::reqwest::Client;

use crate::error::Result;
use crate::models::StatusEnvelope;
use crate::retry;

/// Response status, folding in-band status bodies into the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    /// 2xx.
    Ok,
    /// 404-equivalent.
    NotFound,
    /// 503-equivalent.
    Unavailable,
    /// Anything else.
    Other(u16),
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Body text.
    pub body: String,
    /// Response headers.
    pub headers: HeaderMap,
}

impl RawResponse {
    /// Response with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Status code embedded in the body, if the body is a status envelope.
    pub fn embedded_status(&self) -> Option<u16> {
        serde_json::from_str::<StatusEnvelope>(&self.body)
            .ok()
            .map(|envelope| envelope.status.status_code)
    }

    /// Effective status: the embedded status when present, else the HTTP status.
    pub fn api_status(&self) -> ApiStatus {
        match self.embedded_status().unwrap_or(self.status.as_u16()) {
            200..=299 => ApiStatus::Ok,
            404 => ApiStatus::NotFound,
            503 => ApiStatus::Unavailable,
            other => ApiStatus::Other(other),
        }
    }
}

/// Issues a single GET. Substitutable for tests.
pub trait Transport: Send + Sync {
    /// GET `url` with `headers`, reading the whole body.
    fn get<'a>(&'a self, url: &'a str, headers: &'a HeaderMap) -> BoxFuture<'a, Result<RawResponse>>;
}

/// [`Transport`] over [`riven::reqwest`].
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the underlying client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let user_agent = format!(
            "rankharvest:{version}",
            version = option_env!("GIT_HASH").unwrap_or(env!("CARGO_PKG_VERSION")),
        );
        log::info!("Initializing reqwest client with user agent: {:?}", user_agent);
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a str, headers: &'a HeaderMap) -> BoxFuture<'a, Result<RawResponse>> {
        async move {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_bytes());
            }
            let response = request.send().await?;

            let status = StatusCode::from_u16(response.status().as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut response_headers = HeaderMap::new();
            for (name, value) in response.headers() {
                if let (Ok(name), Ok(value)) = (
                    HeaderName::from_bytes(name.as_str().as_bytes()),
                    HeaderValue::from_bytes(value.as_bytes()),
                ) {
                    response_headers.append(name, value);
                }
            }
            let body = response.text().await?;
            Ok(RawResponse {
                status,
                body,
                headers: response_headers,
            })
        }
        .boxed()
    }
}

/// Client honoring `Retry-After`.
///
/// When a response carries `Retry-After: N`, the calling task sleeps exactly `N` seconds
/// and then re-issues the identical request, with no cap on attempts. The quota is
/// account-wide, so one instance should be shared by every stage.
pub struct RateLimitedClient {
    transport: Box<dyn Transport>,
}

impl RateLimitedClient {
    /// Wraps a transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// GET `url`, sleeping through throttling.
    pub async fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse> {
        loop {
            let response = self.transport.get(url, headers).await?;
            match retry::retry_after(&response.headers)? {
                Some(wait) => {
                    log::warn!("Hit rate limit. Sleep {} seconds.", wait.as_secs());
                    tokio::time::sleep(wait).await;
                    log::debug!("Continue `{}`.", url);
                }
                None => return Ok(response),
            }
        }
    }
}
