use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// A single attempt ran past `request_timeout`.
    #[error("Request attempt timed out after {0:?}")]
    Timeout(Duration),

    /// `total_timeout` elapsed across all attempts.
    #[error("Operation deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Non-2xx status. `body` holds at most [`ERROR_BODY_PREVIEW_LIMIT`] bytes.
    ///
    /// [`ERROR_BODY_PREVIEW_LIMIT`]: crate::ERROR_BODY_PREVIEW_LIMIT
    #[error("HTTP {status}")]
    HttpStatus {
        status: http::StatusCode,
        headers: Box<http::HeaderMap>,
        body: bytes::Bytes,
        retry_after: Option<Duration>,
    },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Form encoding failed: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),

    /// No usable credential for the auth layer. Never retried.
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    /// The buffer worker is gone.
    #[error("Service unavailable: internal failure")]
    ServiceClosed,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri { url: String, reason: String },

    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl HttpError {
    /// Status code for [`HttpError::HttpStatus`], `None` otherwise.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl Error for Refused {}

    #[test]
    fn transport_error_keeps_source() {
        let err = HttpError::Transport(Box::new(Refused));
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<Refused>().is_some());
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn status_accessor() {
        let err = HttpError::HttpStatus {
            status: http::StatusCode::NOT_FOUND,
            headers: Box::default(),
            body: bytes::Bytes::new(),
            retry_after: None,
        };
        assert_eq!(err.status(), Some(http::StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
        assert_eq!(HttpError::ServiceClosed.status(), None);
    }
}
