#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! OAuth credential lifecycle for the wxc Webex client.
//!
//! * [`Tokens`] holds an access/refresh token pair with absolute expiry.
//! * [`Integration`] builds authorize URLs, exchanges codes and refreshes
//!   tokens against the token service.
//! * [`TokenManager`] serialises refreshes for a session and publishes the
//!   current access token to a [`SharedToken`].
//! * [`BearerAuthLayer`] / [`HttpClientBuilderExt::with_bearer_auth`] put
//!   that token on every outgoing request.

pub mod builder_ext;
pub mod error;
pub mod http_error;
pub mod integration;
pub mod layer;
pub mod manager;
pub mod scopes;
pub mod shared;
pub mod tokens;

pub use builder_ext::HttpClientBuilderExt;
pub use error::TokenError;
pub use http_error::format_http_error;
pub use integration::{
    ClientAuthMethod, DEFAULT_AUTH_SERVICE, DEFAULT_MIN_LIFETIME, DEFAULT_TOKEN_SERVICE,
    Integration, IntegrationConfig,
};
pub use layer::{BearerAuthLayer, BearerAuthService};
pub use manager::TokenManager;
pub use scopes::parse_scopes;
pub use shared::SharedToken;
pub use tokens::Tokens;
pub use wxc_utils::SecretString;
