//! Error helpers.

use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error helper type.
#[derive(Debug, Error)]
pub enum Error {
    /// [`riven::reqwest::Error`], connection or protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[from] riven::reqwest::Error),
    /// The API answered with a status the caller does not handle.
    #[error("Unexpected status {status} from `{url}`: {body}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP or in-band status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },
    /// Response body did not match the expected schema.
    #[error("Failed to decode {what}: {source}. Payload: {body}")]
    Decode {
        /// What was being decoded.
        what: String,
        /// Underlying serde error.
        source: serde_json::Error,
        /// Response body excerpt.
        body: String,
    },
    /// `Retry-After` header that is not an integer number of seconds.
    #[error("Invalid `Retry-After` header: {0:?}")]
    RetryAfter(String),
    /// Champion id missing from the lookup table.
    #[error("Champion id {0} not found in lookup table")]
    UnknownChampion(i32),
    /// Match detail violates a structural invariant.
    #[error("Malformed match `{match_id}`: {reason}")]
    MalformedMatch {
        /// Match id.
        match_id: String,
        /// What is wrong with it.
        reason: String,
    },
    /// An upstream artifact does not exist in storage.
    #[error("Missing artifact `{0}`")]
    MissingArtifact(String),
    /// Bad or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Date argument could not be parsed.
    #[error("Invalid date {0:?}, expected `YYYYMMDD`")]
    Date(String),
    /// [`std::io::Error`].
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// [`csv::Error`].
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// [`serde_json::Error`] outside of an API response.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Max characters of a response body kept in errors and logs.
pub const BODY_EXCERPT_LEN: usize = 512;

/// Truncate a response body for error reporting.
pub fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_LEN {
        return body.to_owned();
    }
    let mut out = body.chars().take(BODY_EXCERPT_LEN).collect::<String>();
    out.push('…');
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_excerpt() {
        assert_eq!("short", excerpt("short"));
        let long = "x".repeat(BODY_EXCERPT_LEN + 10);
        assert_eq!(BODY_EXCERPT_LEN + 1, excerpt(&long).chars().count());
    }

    #[test]
    fn test_display() {
        let err = Error::UnknownChampion(9999);
        assert_eq!("Champion id 9999 not found in lookup table", err.to_string());
    }
}
