//! HTTP client error types.

use dockbloxx_commerce::ApiError;
use thiserror::Error;

/// Errors that can occur when talking to the store or payment APIs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be built or sent.
    #[error("Request failed: {0}")]
    Request(String),

    /// Could not connect to the host.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response.
    #[error("HTTP {status} for {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    /// A lookup matched nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Request timeout.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Missing or invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(timeout_ms)
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Http {
                status: 404, url, ..
            } => ApiError::NotFound(url),
            FetchError::NotFound(what) => ApiError::NotFound(what),
            FetchError::Http {
                status, message, ..
            } => ApiError::Http { status, message },
            FetchError::Timeout(_) => ApiError::Timeout,
            FetchError::Parse(msg) => ApiError::Decode(msg),
            FetchError::Request(msg)
            | FetchError::Connection(msg)
            | FetchError::InvalidUrl(msg)
            | FetchError::Config(msg) => ApiError::Network(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_api_error() {
        let not_found = FetchError::Http {
            status: 404,
            url: "https://dockbloxx.test/wp-json/wc/v3/products/9".into(),
            message: "Invalid ID.".into(),
        };
        assert!(matches!(ApiError::from(not_found), ApiError::NotFound(_)));

        let server = FetchError::Http {
            status: 502,
            url: String::new(),
            message: "Bad Gateway".into(),
        };
        assert_eq!(
            ApiError::from(server),
            ApiError::Http {
                status: 502,
                message: "Bad Gateway".into()
            }
        );

        assert_eq!(ApiError::from(FetchError::Timeout(5000)), ApiError::Timeout);
        assert!(ApiError::from(FetchError::Connection("refused".into())).is_transient());
    }

    #[test]
    fn test_status() {
        assert_eq!(FetchError::Timeout(10).status(), None);
        let err = FetchError::Http {
            status: 401,
            url: String::new(),
            message: String::new(),
        };
        assert_eq!(err.status(), Some(401));
    }
}
