use std::fmt;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use wxc_auth::TokenError;
use wxc_http::HttpError;

/// One entry of the `errors` array in a Webex error response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
    tracking_id: Option<String>,
}

/// A non-2xx answer from the REST API.
#[derive(Debug, Clone)]
pub struct RestError {
    pub status: StatusCode,
    pub message: Option<String>,
    pub errors: Vec<ErrorDetail>,
    /// From the body, or else the `trackingid` response header.
    pub tracking_id: Option<String>,
    pub retry_after: Option<Duration>,
    /// Parsed JSON body; a JSON string when the body was not JSON.
    pub body: Value,
}

impl RestError {
    #[must_use]
    pub fn from_response(
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
        retry_after: Option<Duration>,
    ) -> Self {
        let body: Value = serde_json::from_slice(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
        let envelope = ErrorEnvelope::deserialize(&body).unwrap_or_default();
        let tracking_id = envelope.tracking_id.or_else(|| {
            headers
                .get("trackingid")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        });
        Self {
            status,
            message: envelope.message,
            errors: envelope.errors,
            tracking_id,
            retry_after,
            body,
        }
    }

    /// Message plus the per-error descriptions, or the status reason when
    /// the server sent neither.
    #[must_use]
    pub fn description(&self) -> String {
        let details: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.description.as_deref())
            .filter(|d| Some(*d) != self.message.as_deref())
            .collect();
        match (&self.message, details.is_empty()) {
            (Some(message), true) => message.clone(),
            (Some(message), false) => format!("{message}: {}", details.join(", ")),
            (None, false) => details.join(", "),
            (None, true) => self
                .status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_owned(),
        }
    }

    /// First `errorCode` in the error list.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.errors.iter().find_map(|e| e.error_code)
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.description())?;
        if let Some(tracking_id) = &self.tracking_id {
            write!(f, " (tracking id {tracking_id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RestError {}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SdkError {
    #[error("REST API error {0}")]
    Rest(Box<RestError>),

    #[error(transparent)]
    Http(HttpError),

    /// The response did not match the expected model.
    #[error("response validation failed: {0}")]
    Validation(#[from] serde_json::Error),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SdkError {
    /// The REST error, when the server answered with a non-2xx status.
    #[must_use]
    pub fn rest(&self) -> Option<&RestError> {
        match self {
            Self::Rest(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rest(e) => Some(e.status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}

impl From<RestError> for SdkError {
    fn from(e: RestError) -> Self {
        Self::Rest(Box::new(e))
    }
}

impl From<HttpError> for SdkError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::HttpStatus {
                status,
                headers,
                body,
                retry_after,
            } => RestError::from_response(status, &headers, &body, retry_after).into(),
            other => Self::Http(other),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::HeaderValue;

    const ENVELOPE: &str = r#"{
        "message": "The request could not be understood.",
        "errors": [{"description": "Invalid location id.", "errorCode": 4003}],
        "trackingId": "ROUTER_1234"
    }"#;

    #[test]
    fn parses_error_envelope() {
        let err = RestError::from_response(
            StatusCode::BAD_REQUEST,
            &HeaderMap::new(),
            ENVELOPE.as_bytes(),
            None,
        );
        assert_eq!(err.message.as_deref(), Some("The request could not be understood."));
        assert_eq!(err.code(), Some(4003));
        assert_eq!(err.tracking_id.as_deref(), Some("ROUTER_1234"));
        assert_eq!(
            err.description(),
            "The request could not be understood.: Invalid location id."
        );
        assert_eq!(
            err.to_string(),
            "400 Bad Request: The request could not be understood.: Invalid location id. \
             (tracking id ROUTER_1234)"
        );
    }

    #[test]
    fn tracking_id_from_header_and_plain_body() {
        let mut headers = HeaderMap::new();
        headers.insert("trackingid", HeaderValue::from_static("HDR_42"));
        let err = RestError::from_response(
            StatusCode::BAD_GATEWAY,
            &headers,
            b"upstream broke",
            None,
        );
        assert_eq!(err.tracking_id.as_deref(), Some("HDR_42"));
        assert_eq!(err.body, Value::String("upstream broke".into()));
        assert_eq!(err.description(), "Bad Gateway");
    }

    #[test]
    fn duplicate_description_not_repeated() {
        let err = RestError::from_response(
            StatusCode::NOT_FOUND,
            &HeaderMap::new(),
            br#"{"message":"Not found","errors":[{"description":"Not found"}]}"#,
            None,
        );
        assert_eq!(err.description(), "Not found");
    }

    #[test]
    fn http_status_becomes_rest_error() {
        let http = HttpError::HttpStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            headers: Box::default(),
            body: br#"{"message":"slow down"}"#.as_slice().into(),
            retry_after: Some(Duration::from_secs(7)),
        };
        let err = SdkError::from(http);
        let rest = err.rest().unwrap();
        assert_eq!(rest.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rest.retry_after, Some(Duration::from_secs(7)));
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn other_http_errors_stay_transport() {
        let err = SdkError::from(HttpError::Timeout(Duration::from_secs(1)));
        assert!(matches!(err, SdkError::Http(HttpError::Timeout(_))));
        assert!(err.rest().is_none());
    }
}
