//! Backoff policies: `Retry-After` throttling and in-band service unavailability.

use std::time::Duration;

use http::header::RETRY_AFTER;
use http::HeaderMap;

use crate::client::{ApiStatus, RateLimitedClient, RawResponse};
use crate::error::{Error, Result};

/// Wait requested by a `Retry-After` header, in whole seconds.
pub fn retry_after(headers: &HeaderMap) -> Result<Option<Duration>> {
    let Some(value) = headers.get(RETRY_AFTER) else {
        return Ok(None);
    };
    let raw = String::from_utf8_lossy(value.as_bytes());
    raw.trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| Error::RetryAfter(raw.into_owned()))
}

/// Default delay before re-requesting after a 503-equivalent.
pub const UNAVAILABLE_DELAY: Duration = Duration::from_secs(2);

/// Caller-side policy for 503-equivalent responses: sleep a fixed delay and re-request,
/// without limit.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableRetry {
    /// Sleep between attempts.
    pub delay: Duration,
}

impl Default for UnavailableRetry {
    fn default() -> Self {
        Self {
            delay: UNAVAILABLE_DELAY,
        }
    }
}

impl UnavailableRetry {
    /// GET through `client` until the response is not a 503-equivalent.
    pub async fn get(
        &self,
        client: &RateLimitedClient,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<RawResponse> {
        loop {
            let response = client.get(url, headers).await?;
            if ApiStatus::Unavailable != response.api_status() {
                return Ok(response);
            }
            log::warn!(
                "Service unavailable for `{}`. Retry in {:?}.",
                url,
                self.delay
            );
            tokio::time::sleep(self.delay).await;
        }
    }
}
