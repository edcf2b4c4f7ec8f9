use std::fmt;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use figment::Figment;
use figment::providers::Env;
use http::header::AUTHORIZATION;
use serde::Deserialize;
use url::Url;
use wxc_http::{HttpClient, HttpClientBuilder, HttpClientConfig};
use wxc_utils::SecretString;
use zeroize::Zeroizing;

use crate::error::TokenError;
use crate::http_error::format_http_error;
use crate::scopes::parse_scopes;
use crate::tokens::Tokens;

/// Tokens with less than this lifetime left are refreshed by
/// [`Integration::validate_tokens`] callers that use the default.
pub const DEFAULT_MIN_LIFETIME: Duration = Duration::from_secs(300);

pub const DEFAULT_AUTH_SERVICE: &str = "https://webexapis.com/v1/authorize";
pub const DEFAULT_TOKEN_SERVICE: &str = "https://webexapis.com/v1/access_token";

/// How the client credentials reach the token service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuthMethod {
    /// `client_id` and `client_secret` as form fields.
    #[default]
    Form,
    /// `Authorization: Basic base64(client_id:client_secret)`.
    Basic,
}

fn default_auth_service() -> Url {
    Url::parse(DEFAULT_AUTH_SERVICE).unwrap_or_else(|_| unreachable!())
}

fn default_token_service() -> Url {
    Url::parse(DEFAULT_TOKEN_SERVICE).unwrap_or_else(|_| unreachable!())
}

/// Registration data of an OAuth integration.
///
/// `Debug` redacts the client secret.
#[derive(Clone, Deserialize)]
pub struct IntegrationConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Any shape accepted by [`parse_scopes`].
    #[serde(default)]
    pub scopes: String,
    #[serde(default)]
    pub redirect_url: Option<Url>,
    #[serde(default = "default_auth_service")]
    pub auth_service: Url,
    #[serde(default = "default_token_service")]
    pub token_service: Url,
    #[serde(default)]
    pub auth_method: ClientAuthMethod,
    /// Client used for token requests. `None` means
    /// [`HttpClientConfig::token_endpoint`].
    #[serde(skip)]
    pub http_config: Option<HttpClientConfig>,
}

impl IntegrationConfig {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
        scopes: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: scopes.into(),
            redirect_url: None,
            auth_service: default_auth_service(),
            token_service: default_token_service(),
            auth_method: ClientAuthMethod::default(),
            http_config: None,
        }
    }

    /// Reads `WEBEX_CLIENT_ID`, `WEBEX_CLIENT_SECRET`, `WEBEX_SCOPES`,
    /// `WEBEX_REDIRECT_URL` and optional service overrides.
    ///
    /// # Errors
    /// [`TokenError::ConfigError`] when a required variable is missing or
    /// malformed.
    pub fn from_env() -> Result<Self, TokenError> {
        Figment::new()
            .merge(Env::prefixed("WEBEX_").only(&[
                "client_id",
                "client_secret",
                "scopes",
                "redirect_url",
                "auth_service",
                "token_service",
                "auth_method",
            ]))
            .extract()
            .map_err(|e| TokenError::ConfigError(e.to_string()))
    }
}

impl fmt::Debug for IntegrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("redirect_url", &self.redirect_url)
            .field("auth_service", &self.auth_service.as_str())
            .field("token_service", &self.token_service.as_str())
            .field("auth_method", &self.auth_method)
            .finish_non_exhaustive()
    }
}

/// An OAuth integration: builds authorize URLs and talks to the token
/// service.
#[derive(Clone)]
pub struct Integration {
    client_id: String,
    client_secret: SecretString,
    scopes: String,
    redirect_url: Option<Url>,
    auth_service: Url,
    token_service: Url,
    auth_method: ClientAuthMethod,
    client: HttpClient,
}

impl Integration {
    /// Must be called inside a Tokio runtime; the HTTP client spawns its
    /// buffer worker there.
    ///
    /// # Errors
    /// [`TokenError::ConfigError`] for an empty client id or secret, or when
    /// the HTTP client cannot be built.
    pub fn new(config: IntegrationConfig) -> Result<Self, TokenError> {
        if config.client_id.trim().is_empty() {
            return Err(TokenError::ConfigError(
                "client_id must not be empty".into(),
            ));
        }
        if config.client_secret.is_empty() {
            return Err(TokenError::ConfigError(
                "client_secret must not be empty".into(),
            ));
        }

        let http_config = config
            .http_config
            .unwrap_or_else(HttpClientConfig::token_endpoint);
        let client = HttpClientBuilder::with_config(http_config)
            .build()
            .map_err(|e| {
                TokenError::ConfigError(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client_id: config.client_id,
            client_secret: config.client_secret,
            scopes: parse_scopes(&config.scopes),
            redirect_url: config.redirect_url,
            auth_service: config.auth_service,
            token_service: config.token_service,
            auth_method: config.auth_method,
            client,
        })
    }

    /// # Errors
    /// As [`IntegrationConfig::from_env`] and [`Integration::new`].
    pub fn from_env() -> Result<Self, TokenError> {
        Self::new(IntegrationConfig::from_env()?)
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Space-separated, normalised scopes.
    #[must_use]
    pub fn scopes(&self) -> &str {
        &self.scopes
    }

    /// Authorization URL the user has to visit to grant access.
    #[must_use]
    pub fn auth_url(&self, state: &str) -> Url {
        let mut pairs = vec![
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
        ];
        if let Some(redirect) = &self.redirect_url {
            pairs.push(("redirect_uri", redirect.as_str()));
        }
        pairs.push(("scope", &self.scopes));
        pairs.push(("state", state));

        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut url = self.auth_service.clone();
        url.set_query(Some(&query));
        url
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    /// See [`TokenError`].
    pub async fn tokens_from_code(&self, code: &str) -> Result<Tokens, TokenError> {
        let mut grant = vec![("grant_type", "authorization_code"), ("code", code)];
        if let Some(redirect) = &self.redirect_url {
            grant.push(("redirect_uri", redirect.as_str()));
        }
        self.request_tokens(&grant).await
    }

    /// Uses the refresh token to get a new access token.
    ///
    /// On failure the access token is cleared. Without a refresh token the
    /// tokens are left untouched.
    ///
    /// # Errors
    /// [`TokenError::MissingRefreshToken`] or any token-service failure.
    pub async fn refresh(&self, tokens: &mut Tokens) -> Result<(), TokenError> {
        let Some(refresh_token) = tokens.refresh_token.as_ref() else {
            return Err(TokenError::MissingRefreshToken);
        };
        let refresh_token = Zeroizing::new(refresh_token.expose().to_owned());

        let grant = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];
        match self.request_tokens(&grant).await {
            Ok(new) => {
                tokens.update(new);
                tracing::info!(
                    client_id = %self.client_id,
                    expires_in = ?tokens.expires_in,
                    "access token refreshed"
                );
                Ok(())
            }
            Err(e) => {
                tokens.clear_access_token();
                Err(e)
            }
        }
    }

    /// Refreshes once when less than `min_lifetime` is left.
    ///
    /// Returns whether a refresh was attempted. Refresh failures are logged,
    /// not returned; check [`Tokens::is_valid`] afterwards.
    pub async fn validate_tokens(&self, tokens: &mut Tokens, min_lifetime: Duration) -> bool {
        if !tokens.needs_refresh(min_lifetime) {
            return false;
        }
        tracing::debug!(
            remaining = tokens.remaining(),
            min_lifetime_secs = min_lifetime.as_secs(),
            "access token close to expiry"
        );
        if let Err(e) = self.refresh(tokens).await {
            tracing::warn!(error = %e, "token refresh failed");
        }
        true
    }

    async fn request_tokens(&self, grant: &[(&str, &str)]) -> Result<Tokens, TokenError> {
        let secret = Zeroizing::new(self.client_secret.expose().to_owned());
        let mut fields: Vec<(&str, &str)> = grant.to_vec();
        let mut builder = self.client.post(self.token_service.as_str());

        match self.auth_method {
            ClientAuthMethod::Form => {
                fields.push(("client_id", &self.client_id));
                fields.push(("client_secret", &secret));
            }
            ClientAuthMethod::Basic => {
                let credentials = Zeroizing::new(format!("{}:{}", self.client_id, &*secret));
                let encoded =
                    Zeroizing::new(general_purpose::STANDARD.encode(credentials.as_bytes()));
                let header_value = Zeroizing::new(format!("Basic {}", &*encoded));
                builder = builder.header(AUTHORIZATION.as_str(), &header_value);
            }
        }

        let response = builder
            .form(fields.as_slice())
            .map_err(|e| TokenError::Http(format_http_error(&e, "OAuth token")))?
            .send()
            .await
            .map_err(|e| TokenError::Http(format_http_error(&e, "OAuth token")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Rejected { status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TokenError::Http(format_http_error(&e, "OAuth token")))?;
        let mut tokens: Tokens = serde_json::from_slice(&body).map_err(|e| {
            TokenError::InvalidResponse(format!(
                "malformed JSON at line {} column {}",
                e.line(),
                e.column()
            ))
        })?;

        if tokens.access_token.as_ref().is_none_or(SecretString::is_empty) {
            return Err(TokenError::InvalidResponse(
                "missing access_token".into(),
            ));
        }
        if let Some(token_type) = &tokens.token_type
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            return Err(TokenError::UnsupportedTokenType(token_type.clone()));
        }

        tokens.set_expiration();
        Ok(tokens)
    }
}

impl fmt::Debug for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integration")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("token_service", &self.token_service.as_str())
            .finish_non_exhaustive()
    }
}
