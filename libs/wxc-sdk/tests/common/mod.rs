//! Session wiring shared by the integration tests.

#![allow(dead_code)]

use httpmock::MockServer;
use url::Url;
use wxc_auth::{Integration, IntegrationConfig};
use wxc_http::{ExponentialBackoff, HttpClientConfig, RetryConfig, TransportSecurity};
use wxc_sdk::{RestSession, Tokens, WebexConfig};

pub fn config(server: &MockServer) -> WebexConfig {
    WebexConfig {
        base_url: Url::parse(&server.url("/v1")).unwrap(),
        ..WebexConfig::default()
    }
}

pub fn http_config(config: &WebexConfig) -> HttpClientConfig {
    HttpClientConfig {
        transport: TransportSecurity::AllowInsecureHttp,
        retry: Some(RetryConfig {
            backoff: ExponentialBackoff::fast(),
            ..RetryConfig::throttling_only(config.max_retries)
        }),
        ..config.http_config()
    }
}

/// Routes library logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wxc_auth=debug,wxc_http=debug,wxc_sdk=debug")
        .with_test_writer()
        .try_init();
}

pub fn session_with(server: &MockServer, tokens: Tokens, integration: Option<Integration>) -> RestSession {
    init_tracing();
    let config = config(server);
    let mut builder = RestSession::builder(config.clone())
        .tokens(tokens)
        .http_config(http_config(&config));
    if let Some(integration) = integration {
        builder = builder.integration(integration);
    }
    builder.build().unwrap()
}

pub fn session(server: &MockServer) -> RestSession {
    session_with(server, Tokens::from_access_token("tok"), None)
}

pub fn integration(server: &MockServer) -> Integration {
    Integration::new(IntegrationConfig {
        token_service: Url::parse(&server.url("/v1/access_token")).unwrap(),
        http_config: Some(HttpClientConfig::for_testing()),
        ..IntegrationConfig::new("C123", "s3cret", "spark:kms spark:people_read")
    })
    .unwrap()
}

/// `Link` header value pointing at `path` on the mock server.
pub fn next_link(server: &MockServer, path: &str) -> String {
    format!("<{}>; rel=\"next\"", server.url(path))
}
