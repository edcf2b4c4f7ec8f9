use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use url::Url;
use wxc_http::{HttpClientConfig, RetryConfig};
use wxc_utils::SecretString;

use crate::error::SdkError;

pub const DEFAULT_BASE_URL: &str = "https://webexapis.com/v1";
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 40;
pub const ENV_PREFIX: &str = "WEBEX_";

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!())
}

/// Session settings.
///
/// Layered as defaults, then an optional YAML file, then `WEBEX_*`
/// environment variables:
///
/// ```yaml
/// base_url: https://webexapis.com/v1
/// concurrent_requests: 10
/// request_timeout: 30s
/// total_timeout: 5m
/// max_retries: 3
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct WebexConfig {
    pub base_url: Url,
    /// Personal, bot or service-app token used when no tokens are passed
    /// to the session builder.
    pub access_token: Option<SecretString>,
    /// Upper bound of in-flight requests per session.
    pub concurrent_requests: usize,
    #[serde(with = "wxc_utils::humantime_serde")]
    pub request_timeout: Duration,
    #[serde(with = "wxc_utils::humantime_serde::option")]
    pub total_timeout: Option<Duration>,
    pub max_retries: usize,
    pub user_agent: Option<String>,
    /// Retry `429 Too Many Requests` after `Retry-After`.
    pub retry_429: bool,
}

impl Default for WebexConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            request_timeout: Duration::from_secs(60),
            total_timeout: None,
            max_retries: 3,
            user_agent: None,
            retry_429: true,
        }
    }
}

impl WebexConfig {
    /// Defaults overridden by `WEBEX_*` environment variables.
    ///
    /// # Errors
    /// [`SdkError::Config`] when a variable does not parse.
    pub fn from_env() -> Result<Self, SdkError> {
        Self::figment(None).extract().map_err(config_error)
    }

    /// Defaults, then `path`, then `WEBEX_*` environment variables.
    ///
    /// # Errors
    /// [`SdkError::Config`] when the file or a variable does not parse.
    pub fn load(path: &Path) -> Result<Self, SdkError> {
        Self::figment(Some(path)).extract().map_err(config_error)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).only(&[
            "base_url",
            "access_token",
            "concurrent_requests",
            "request_timeout",
            "total_timeout",
            "max_retries",
            "user_agent",
            "retry_429",
        ]))
    }

    /// Transport settings derived from this config.
    #[must_use]
    pub fn http_config(&self) -> HttpClientConfig {
        let defaults = HttpClientConfig::default();
        let retry = if self.retry_429 {
            RetryConfig::throttling_only(self.max_retries)
        } else {
            RetryConfig::disabled()
        };
        HttpClientConfig {
            request_timeout: self.request_timeout,
            total_timeout: self.total_timeout,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent.clone()),
            retry: Some(retry),
            max_concurrent_requests: Some(self.concurrent_requests.max(1)),
            ..defaults
        }
    }
}

fn config_error(e: figment::Error) -> SdkError {
    SdkError::Config(e.to_string())
}

impl std::fmt::Debug for WebexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebexConfig")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &self.access_token)
            .field("concurrent_requests", &self.concurrent_requests)
            .field("request_timeout", &self.request_timeout)
            .field("total_timeout", &self.total_timeout)
            .field("max_retries", &self.max_retries)
            .field("user_agent", &self.user_agent)
            .field("retry_429", &self.retry_429)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use wxc_http::RetryTrigger;

    #[test]
    fn defaults() {
        let cfg = WebexConfig::default();
        assert_eq!(cfg.base_url.as_str(), "https://webexapis.com/v1");
        assert_eq!(cfg.concurrent_requests, 40);
        assert_eq!(cfg.max_retries, 3);
        assert!(cfg.retry_429);

        let http = cfg.http_config();
        assert_eq!(http.max_concurrent_requests, Some(40));
        let retry = http.retry.unwrap();
        assert_eq!(retry.max_retries, 3);
        assert!(retry.always_retry.contains(&RetryTrigger::TOO_MANY_REQUESTS));
        assert!(retry.idempotent_retry.is_empty());
        assert!(!retry.should_retry(RetryTrigger::INTERNAL_SERVER_ERROR, &http::Method::GET));
        assert!(!retry.should_retry(RetryTrigger::TransportError, &http::Method::GET));
    }

    #[test]
    fn env_overrides() {
        temp_env::with_vars(
            [
                ("WEBEX_ACCESS_TOKEN", Some("env-token")),
                ("WEBEX_CONCURRENT_REQUESTS", Some("8")),
                ("WEBEX_REQUEST_TIMEOUT", Some("15s")),
                ("WEBEX_TOTAL_TIMEOUT", Some("2m")),
                ("WEBEX_RETRY_429", Some("false")),
            ],
            || {
                let cfg = WebexConfig::from_env().unwrap();
                assert_eq!(cfg.access_token.as_ref().unwrap().expose(), "env-token");
                assert_eq!(cfg.concurrent_requests, 8);
                assert_eq!(cfg.request_timeout, Duration::from_secs(15));
                assert_eq!(cfg.total_timeout, Some(Duration::from_secs(120)));

                let http = cfg.http_config();
                assert_eq!(http.max_concurrent_requests, Some(8));
                let retry = http.retry.unwrap();
                assert_eq!(retry.max_retries, 0);
                assert!(!retry.should_retry(RetryTrigger::SERVICE_UNAVAILABLE, &http::Method::GET));
            },
        );
    }

    #[test]
    fn yaml_file_then_env() {
        let dir = std::env::temp_dir().join(format!("wxc-sdk-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("webex.yaml");
        std::fs::write(
            &path,
            "base_url: https://example.test/v1\nmax_retries: 5\nrequest_timeout: 30s\n",
        )
        .unwrap();

        temp_env::with_vars([("WEBEX_MAX_RETRIES", Some("1"))], || {
            let cfg = WebexConfig::load(&path).unwrap();
            assert_eq!(cfg.base_url.as_str(), "https://example.test/v1");
            assert_eq!(cfg.request_timeout, Duration::from_secs(30));
            assert_eq!(cfg.max_retries, 1);
        });

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn bad_duration_is_config_error() {
        temp_env::with_vars([("WEBEX_REQUEST_TIMEOUT", Some("soon"))], || {
            let err = WebexConfig::from_env().unwrap_err();
            assert!(matches!(err, SdkError::Config(_)), "got {err:?}");
        });
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = WebexConfig {
            access_token: Some(SecretString::new("s3cr3t-value")),
            ..WebexConfig::default()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("s3cr3t-value"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
