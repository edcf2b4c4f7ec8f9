#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the Webex client crates.
//!
//! A hyper client wrapped in a tower stack:
//!
//! ```text
//! Buffer -> ConcurrencyLimit -> Retry -> [Auth] -> Timeout -> UserAgent -> Decompression -> hyper
//! ```
//!
//! `send()` resolves to `Ok` for every HTTP status. Callers turn non-2xx into
//! errors with [`HttpResponse::error_for_status`], [`HttpResponse::json`] or
//! [`HttpResponse::checked_bytes`].
//!
//! Throttling (`429`) is retried for every method, honouring `Retry-After`.
//! Transport errors, timeouts, `408` and `5xx` are retried only for
//! idempotent methods.
//!
//! ```ignore
//! use wxc_http::HttpClient;
//!
//! let client = HttpClient::builder().build()?;
//! let people: serde_json::Value = client
//!     .get("https://webexapis.com/v1/people")
//!     .query(&[("max", "10")])
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
pub mod layers;
mod request;
mod response;
mod security;
mod tls;

pub use builder::{HttpClientBuilder, InnerService};
pub use client::HttpClient;
pub use config::{
    DEFAULT_USER_AGENT, ExponentialBackoff, HttpClientConfig, RetryConfig, RetryTrigger,
    TlsRootConfig, TransportSecurity, is_idempotent_method,
};
pub use error::HttpError;
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody, parse_retry_after};
pub use security::ERROR_BODY_PREVIEW_LIMIT;
