mod common;

use httpmock::prelude::*;
use serde_json::json;
use wxc_http::HttpError;
use wxc_sdk::{SdkError, Tokens};
use wxc_utils::SecretString;

fn expiring(secs: u64) -> Tokens {
    let mut tokens = Tokens {
        access_token: Some(SecretString::new("old")),
        refresh_token: Some(SecretString::new("rt-1")),
        expires_in: Some(secs),
        ..Tokens::default()
    };
    tokens.set_expiration();
    tokens
}

#[tokio::test]
async fn stale_token_is_refreshed_before_request() {
    let server = MockServer::start();
    let refresh = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/access_token")
            .body_includes("grant_type=refresh_token");
        then.status(200)
            .json_body(json!({"access_token": "new", "expires_in": 1_209_599}));
    });
    let me = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/people/me")
            .header("authorization", "Bearer new");
        then.status(200).json_body(json!({"id": "p1"}));
    });

    let session = common::session_with(&server, expiring(60), Some(common::integration(&server)));
    let v = session.get(&session.ep("people/me"), None).await.unwrap();
    assert_eq!(v["id"], "p1");

    // Second request uses the refreshed token without another refresh.
    session.get(&session.ep("people/me"), None).await.unwrap();
    refresh.assert_calls(1);
    me.assert_calls(2);
}

#[tokio::test]
async fn healthy_token_is_not_refreshed() {
    let server = MockServer::start();
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/v1/access_token");
        then.status(200).json_body(json!({"access_token": "new"}));
    });
    let me = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/people/me")
            .header("authorization", "Bearer old");
        then.status(200).json_body(json!({"id": "p1"}));
    });

    let session = common::session_with(&server, expiring(3600), Some(common::integration(&server)));
    session.get(&session.ep("people/me"), None).await.unwrap();
    refresh.assert_calls(0);
    me.assert_calls(1);
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    let server = MockServer::start();
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/v1/access_token");
        then.status(200)
            .delay(std::time::Duration::from_millis(100))
            .json_body(json!({"access_token": "new", "expires_in": 3600}));
    });
    let me = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/people/me")
            .header("authorization", "Bearer new");
        then.status(200).json_body(json!({"id": "p1"}));
    });

    let session = common::session_with(&server, expiring(10), Some(common::integration(&server)));
    let url = session.ep("people/me");
    let calls = (0..5).map(|_| session.get(&url, None));
    let results = session.fan_out(calls).await;

    assert!(results.iter().all(Result::is_ok));
    refresh.assert_calls(1);
    me.assert_calls(5);
}

#[tokio::test]
async fn failed_refresh_leaves_session_unauthenticated() {
    let server = MockServer::start();
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/v1/access_token");
        then.status(400).json_body(json!({"message": "invalid_grant"}));
    });
    let api = server.mock(|when, then| {
        when.path("/v1/people/me");
        then.status(200);
    });

    let session = common::session_with(&server, expiring(10), Some(common::integration(&server)));
    let err = session.get(&session.ep("people/me"), None).await.unwrap_err();

    assert!(
        matches!(err, SdkError::Http(HttpError::Credentials(_))),
        "got {err:?}"
    );
    refresh.assert_calls(1);
    api.assert_calls(0);
    assert!(session.token_manager().tokens().await.access_token.is_none());
}
