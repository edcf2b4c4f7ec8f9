use std::time::{Duration, SystemTime};

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::HttpError;
use crate::security::ERROR_BODY_PREVIEW_LIMIT;

/// `Retry-After` as delta-seconds or an HTTP-date (RFC 9110 section 10.2.3).
///
/// Negative values and dates in the past yield `None`.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<i64>() {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }

    httpdate::parse_http_date(value)
        .ok()?
        .duration_since(SystemTime::now())
        .ok()
}

/// Decompressed, type-erased response body.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Response with size-limited body readers.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    #[must_use]
    pub fn into_inner(self) -> Response<ResponseBody> {
        self.inner
    }

    /// Fails on non-2xx without reading the body.
    ///
    /// # Errors
    /// `HttpError::HttpStatus` with an empty body.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.inner.status().is_success() {
            return Ok(self);
        }
        Err(HttpError::HttpStatus {
            status: self.inner.status(),
            retry_after: parse_retry_after(self.inner.headers()),
            headers: Box::new(self.inner.headers().clone()),
            body: Bytes::new(),
        })
    }

    /// Whole body, any status.
    ///
    /// # Errors
    /// `BodyTooLarge` past `max_body_size`, `Transport` on read failure.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        read_body_limited(self.inner, self.max_body_size).await
    }

    /// Whole body of a 2xx response.
    ///
    /// # Errors
    /// `HttpStatus` for non-2xx, carrying the headers and a body preview.
    /// `BodyTooLarge` past `max_body_size`.
    pub async fn checked_bytes(self) -> Result<Bytes, HttpError> {
        checked_body(self.inner, self.max_body_size).await
    }

    /// # Errors
    /// As [`checked_bytes`](Self::checked_bytes), plus `Json` on a parse failure.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let body = checked_body(self.inner, self.max_body_size).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// # Errors
    /// As [`checked_bytes`](Self::checked_bytes).
    pub async fn text(self) -> Result<String, HttpError> {
        let body = checked_body(self.inner, self.max_body_size).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

async fn checked_body(
    response: Response<ResponseBody>,
    max_body_size: usize,
) -> Result<Bytes, HttpError> {
    let status = response.status();
    if status.is_success() {
        return read_body_limited(response, max_body_size).await;
    }

    let headers = Box::new(response.headers().clone());
    let retry_after = parse_retry_after(&headers);
    let preview_limit = max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);
    let body = match read_body_limited(response, preview_limit).await {
        Ok(bytes) => bytes,
        // keep the status error visible even when the body is huge
        Err(HttpError::BodyTooLarge { .. }) => Bytes::new(),
        Err(e) => return Err(e),
    };

    Err(HttpError::HttpStatus {
        status,
        headers,
        body,
        retry_after,
    })
}

pub(crate) async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, HttpError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut collected = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            let actual = collected.len() + chunk.len();
            if actual > limit {
                return Err(HttpError::BodyTooLarge { limit, actual });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}
