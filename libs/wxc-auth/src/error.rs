use thiserror::Error;

/// Errors from the OAuth flows.
///
/// No variant ever carries a client secret or token value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// Transport-level failure, formatted by
    /// [`format_http_error`](crate::format_http_error).
    #[error("{0}")]
    Http(String),

    /// The token service answered with a non-2xx status.
    #[error("token service rejected the grant: HTTP {status}")]
    Rejected { status: http::StatusCode },

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// `refresh` was called on tokens without a refresh token.
    #[error("no refresh token available")]
    MissingRefreshToken,

    #[error("integration config error: {0}")]
    ConfigError(String),

    /// No access token has been published yet, or it was cleared.
    #[error("token unavailable: {0}")]
    Unavailable(String),
}

impl TokenError {
    /// True when the token service itself refused the grant, as opposed to
    /// the request never completing.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
