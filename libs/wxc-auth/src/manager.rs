use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::TokenError;
use crate::integration::{DEFAULT_MIN_LIFETIME, Integration};
use crate::shared::SharedToken;
use crate::tokens::Tokens;

/// Owns the tokens of one session.
///
/// Refreshes are serialised: concurrent callers of
/// [`ensure_fresh`](Self::ensure_fresh) wait for the first one and then see
/// its result, so a burst of requests near expiry triggers a single refresh.
/// The current access token is published to a [`SharedToken`] that the
/// bearer layer reads without locking.
#[derive(Debug)]
pub struct TokenManager {
    integration: Option<Integration>,
    tokens: Mutex<Tokens>,
    shared: SharedToken,
    min_lifetime: Duration,
}

impl TokenManager {
    /// Without an integration the tokens are used as-is and never refreshed.
    #[must_use]
    pub fn new(tokens: Tokens, integration: Option<Integration>) -> Self {
        let shared = SharedToken::new(tokens.access_token.clone());
        Self {
            integration,
            tokens: Mutex::new(tokens),
            shared,
            min_lifetime: DEFAULT_MIN_LIFETIME,
        }
    }

    #[must_use]
    pub fn with_min_lifetime(mut self, min_lifetime: Duration) -> Self {
        self.min_lifetime = min_lifetime;
        self
    }

    /// Handle for [`BearerAuthLayer`](crate::BearerAuthLayer).
    #[must_use]
    pub fn shared_token(&self) -> SharedToken {
        self.shared.clone()
    }

    /// Refreshes when the access token is close to expiry.
    ///
    /// Tokens without a refresh token are used as-is. Returns whether a
    /// refresh was attempted. A failed refresh leaves no
    /// published token, so the next request fails with missing credentials.
    pub async fn ensure_fresh(&self) -> bool {
        let Some(integration) = &self.integration else {
            return false;
        };
        let mut tokens = self.tokens.lock().await;
        if tokens.refresh_token.is_none() {
            return false;
        }
        let attempted = integration
            .validate_tokens(&mut tokens, self.min_lifetime)
            .await;
        if attempted {
            self.shared.publish(tokens.access_token.clone());
        }
        attempted
    }

    /// Unconditional refresh.
    ///
    /// # Errors
    /// [`TokenError::ConfigError`] without an integration, otherwise as
    /// [`Integration::refresh`].
    pub async fn refresh(&self) -> Result<(), TokenError> {
        let Some(integration) = &self.integration else {
            return Err(TokenError::ConfigError(
                "no integration configured for token refresh".into(),
            ));
        };
        let mut tokens = self.tokens.lock().await;
        let result = integration.refresh(&mut tokens).await;
        self.shared.publish(tokens.access_token.clone());
        result
    }

    /// Snapshot of the current tokens.
    pub async fn tokens(&self) -> Tokens {
        self.tokens.lock().await.clone()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::IntegrationConfig;
    use httpmock::prelude::*;
    use url::Url;
    use wxc_http::HttpClientConfig;
    use wxc_utils::SecretString;

    fn integration(server: &MockServer) -> Integration {
        Integration::new(IntegrationConfig {
            token_service: Url::parse(&server.url("/v1/access_token")).unwrap(),
            http_config: Some(HttpClientConfig::for_testing()),
            ..IntegrationConfig::new("C123", "s3cret", "spark:kms")
        })
        .unwrap()
    }

    fn stale_tokens() -> Tokens {
        let mut t = Tokens {
            access_token: Some(SecretString::new("old")),
            refresh_token: Some(SecretString::new("rt")),
            expires_in: Some(30),
            ..Tokens::default()
        };
        t.set_expiration();
        t
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/access_token");
            then.status(200)
                .delay(std::time::Duration::from_millis(100))
                .body(r#"{"access_token":"new","expires_in":3600}"#);
        });

        let manager = Arc::new(TokenManager::new(stale_tokens(), Some(integration(&server))));
        let shared = manager.shared_token();
        assert_eq!(shared.get().unwrap().expose(), "old");

        let (a, b) = tokio::join!(manager.ensure_fresh(), manager.ensure_fresh());
        // One caller refreshed, the other found a fresh token.
        assert!(a ^ b);
        mock.assert_calls(1);
        assert_eq!(shared.get().unwrap().expose(), "new");
        assert!(manager.tokens().await.remaining() > 3500);
    }

    #[tokio::test]
    async fn failed_refresh_unpublishes_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/access_token");
            then.status(400);
        });

        let manager = TokenManager::new(stale_tokens(), Some(integration(&server)));
        assert!(manager.ensure_fresh().await);
        assert!(manager.shared_token().get().is_err());
    }

    #[tokio::test]
    async fn static_token_is_never_refreshed() {
        let manager = TokenManager::new(Tokens::from_access_token("personal"), None);
        assert!(!manager.ensure_fresh().await);
        assert_eq!(manager.shared_token().get().unwrap().expose(), "personal");
        assert!(matches!(
            manager.refresh().await,
            Err(TokenError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn token_without_refresh_token_is_left_alone() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });

        let manager = TokenManager::new(
            Tokens::from_access_token("personal"),
            Some(integration(&server)),
        );
        for _ in 0..3 {
            assert!(!manager.ensure_fresh().await);
        }
        mock.assert_calls(0);
        assert_eq!(manager.shared_token().get().unwrap().expose(), "personal");
    }

    #[tokio::test]
    async fn explicit_refresh_publishes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/access_token");
            then.status(200)
                .body(r#"{"access_token":"forced","expires_in":3600}"#);
        });

        let manager = TokenManager::new(stale_tokens(), Some(integration(&server)))
            .with_min_lifetime(Duration::from_secs(10));
        assert!(!manager.ensure_fresh().await);
        manager.refresh().await.unwrap();
        mock.assert();
        assert_eq!(manager.shared_token().get().unwrap().expose(), "forced");
    }
}
