#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Async client for the Webex REST API.
//!
//! [`WebexSimpleApi`] bundles the endpoint groups over one [`RestSession`].
//! The session attaches the bearer token, refreshes it through an
//! [`Integration`](wxc_auth::Integration) when one is configured, retries
//! throttled requests and walks `Link`-header pagination lazily through
//! [`RestSession::follow_pagination`].
//!
//! ```ignore
//! use futures_util::TryStreamExt;
//! use wxc_sdk::{WebexSimpleApi, api::people::ListPeople};
//!
//! let api = WebexSimpleApi::from_env()?;
//! let people: Vec<_> = api
//!     .people
//!     .list(&ListPeople { calling_data: true, ..ListPeople::default() })
//!     .try_collect()
//!     .await?;
//! ```

pub mod api;
pub mod api_child;
pub mod config;
pub mod error;
pub mod pagination;
pub mod params;
pub mod safe_enum;
pub mod session;
pub mod webex;

pub use api_child::ApiChild;
pub use config::WebexConfig;
pub use error::{ErrorDetail, RestError, SdkError};
pub use pagination::{LinkPager, Page, PageRequest, PagesPager};
pub use params::{QueryParams, QueryValue};
pub use session::{RestSession, RestSessionBuilder};
pub use webex::WebexSimpleApi;

pub use wxc_auth::{Integration, IntegrationConfig, TokenError, Tokens};

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
