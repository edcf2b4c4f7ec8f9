use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderValue, Request, Response};
use http_body_util::{BodyExt, Full};
use rand::Rng;
use tower::{Layer, Service, ServiceExt};

use crate::config::{ExponentialBackoff, RetryConfig, RetryTrigger};
use crate::error::HttpError;
use crate::response::{ResponseBody, parse_retry_after};

/// Set on re-sent requests; value is the 1-based retry number.
pub const RETRY_ATTEMPT_HEADER: &str = "x-retry-attempt";

/// Re-sends requests according to a [`RetryConfig`].
///
/// Retries both transport failures and retryable statuses. Once retries are
/// exhausted the last response is returned as `Ok`, so the caller still sees
/// the server's status and body.
#[derive(Clone)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
    total_timeout: Option<Duration>,
}

impl RetryLayer {
    #[must_use]
    pub fn new(config: RetryConfig, total_timeout: Option<Duration>) -> Self {
        Self {
            config: Arc::new(config),
            total_timeout,
        }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            config: Arc::clone(&self.config),
            total_timeout: self.total_timeout,
        }
    }
}

#[derive(Clone)]
pub struct RetryService<S> {
    inner: S,
    config: Arc<RetryConfig>,
    total_timeout: Option<Duration>,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

impl<S> Service<Request<Full<Bytes>>> for RetryService<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = Response<ResponseBody>;
    type Error = HttpError;
    type Future = BoxFuture<Result<Self::Response, HttpError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        // consume the instance that was poll_ready'd
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let config = Arc::clone(&self.config);
        let attempts = run_with_retries(inner, config, req);

        match self.total_timeout {
            Some(total) => Box::pin(async move {
                tokio::time::timeout(total, attempts)
                    .await
                    .unwrap_or(Err(HttpError::DeadlineExceeded(total)))
            }),
            None => Box::pin(attempts),
        }
    }
}

async fn run_with_retries<S>(
    inner: S,
    config: Arc<RetryConfig>,
    req: Request<Full<Bytes>>,
) -> Result<Response<ResponseBody>, HttpError>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResponseBody>, Error = HttpError>
        + Clone,
{
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let uri = parts.uri.clone();

    let mut attempt = 0usize;
    loop {
        let mut req = Request::from_parts(parts.clone(), body.clone());
        if attempt > 0
            && let Ok(value) = HeaderValue::try_from(attempt.to_string())
        {
            req.headers_mut().insert(RETRY_ATTEMPT_HEADER, value);
        }

        let result = inner.clone().oneshot(req).await;
        let retries_left = attempt < config.max_retries;

        let delay = match result {
            Ok(resp) => {
                let trigger = RetryTrigger::Status(resp.status().as_u16());
                if !retries_left || !config.should_retry(trigger, &method) {
                    return Ok(resp);
                }
                let retry_after = parse_retry_after(resp.headers())
                    .filter(|_| !config.ignore_retry_after)
                    .map(|d| d.min(config.max_retry_after));
                let delay =
                    retry_after.unwrap_or_else(|| calculate_backoff(&config.backoff, attempt));
                tracing::debug!(
                    retry = attempt + 1,
                    max_retries = config.max_retries,
                    status = resp.status().as_u16(),
                    method = %method,
                    uri = %uri,
                    delay_ms = delay.as_millis(),
                    retry_after = retry_after.is_some(),
                    "retrying request after status"
                );
                if let Err(e) = drain(resp, config.retry_response_drain_limit).await {
                    tracing::debug!(error = %e, "failed to drain response before retry");
                }
                delay
            }
            Err(err) => {
                if !retries_left || !config.should_retry(retry_trigger(&err), &method) {
                    return Err(err);
                }
                let delay = calculate_backoff(&config.backoff, attempt);
                tracing::debug!(
                    retry = attempt + 1,
                    max_retries = config.max_retries,
                    error = %err,
                    method = %method,
                    uri = %uri,
                    delay_ms = delay.as_millis(),
                    "retrying request after error"
                );
                delay
            }
        };

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Reads up to `limit` bytes so HTTP/1.1 can reuse the connection.
async fn drain(response: Response<ResponseBody>, limit: usize) -> Result<(), HttpError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut drained = 0usize;
    while drained < limit {
        match body.frame().await {
            Some(frame) => {
                let frame = frame.map_err(HttpError::Transport)?;
                drained += frame.data_ref().map_or(0, Bytes::len);
            }
            None => break,
        }
    }
    Ok(())
}

fn retry_trigger(err: &HttpError) -> RetryTrigger {
    match err {
        HttpError::Transport(_) => RetryTrigger::TransportError,
        HttpError::Timeout(_) => RetryTrigger::Timeout,
        _ => RetryTrigger::NonRetryable,
    }
}

/// Backoff for the given zero-based attempt, capped at `backoff.max`.
#[must_use]
pub fn calculate_backoff(backoff: &ExponentialBackoff, attempt: usize) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let multiplier = if backoff.multiplier.is_finite() && backoff.multiplier >= 0.0 {
        backoff.multiplier
    } else {
        1.0
    };
    let max_secs = backoff.max.as_secs_f64();
    let secs = backoff.initial.as_secs_f64() * multiplier.powi(exponent);
    let secs = if secs.is_finite() {
        secs.clamp(0.0, max_secs)
    } else {
        max_secs
    };
    let base = Duration::from_secs_f64(secs);

    if backoff.jitter {
        base + base.mul_f64(rand::rng().random_range(0.0..=0.25))
    } else {
        base
    }
}
