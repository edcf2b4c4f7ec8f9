mod common;

use futures_util::{StreamExt, TryStreamExt};
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
use wxc_sdk::{QueryParams, SdkError};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u32,
}

#[tokio::test]
async fn follows_links_until_last_page() {
    let server = MockServer::start();
    let page1 = server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("max", "2");
        then.status(200)
            .header("link", common::next_link(&server, "/v1/items?cursor=p2"))
            .json_body(json!({"items": [{"id": 1}, {"id": 2}]}));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("cursor", "p2");
        then.status(200)
            .header("link", common::next_link(&server, "/v1/items?cursor=p3"))
            .json_body(json!({"items": [{"id": 3}, {"id": 4}]}));
    });
    let page3 = server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("cursor", "p3");
        then.status(200).json_body(json!({"items": [{"id": 5}]}));
    });

    let session = common::session(&server);
    let items: Vec<Item> = session
        .follow_pagination(
            &session.ep("items"),
            Some(QueryParams::new().set("max", 2_u32)),
            Some("items"),
        )
        .try_collect()
        .await
        .unwrap();

    let ids: Vec<u32> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
    page1.assert_calls(1);
    page2.assert_calls(1);
    page3.assert_calls(1);
}

#[tokio::test]
async fn next_page_waits_for_consumer() {
    let server = MockServer::start();
    let page1 = server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("max", "2");
        then.status(200)
            .header("link", common::next_link(&server, "/v1/items?cursor=p2"))
            .json_body(json!({"items": [{"id": 1}, {"id": 2}]}));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("cursor", "p2");
        then.status(200).json_body(json!({"items": [{"id": 3}]}));
    });

    let session = common::session(&server);
    let mut items = Box::pin(session.follow_pagination::<Item>(
        &session.ep("items"),
        Some(QueryParams::new().set("max", 2_u32)),
        Some("items"),
    ));
    page1.assert_calls(0);

    assert_eq!(items.next().await.unwrap().unwrap(), Item { id: 1 });
    assert_eq!(items.next().await.unwrap().unwrap(), Item { id: 2 });
    page1.assert_calls(1);
    page2.assert_calls(0);

    assert_eq!(items.next().await.unwrap().unwrap(), Item { id: 3 });
    page2.assert_calls(1);
    assert!(items.next().await.is_none());
}

#[tokio::test]
async fn each_call_restarts_from_first_page() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/v1/items");
        then.status(200).json_body(json!({"items": [{"id": 1}]}));
    });

    let session = common::session(&server);
    for _ in 0..2 {
        let items: Vec<Item> = session
            .follow_pagination(&session.ep("items"), None, Some("items"))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(items, [Item { id: 1 }]);
    }
    page.assert_calls(2);
}

#[tokio::test]
async fn error_page_ends_stream() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("max", "2");
        then.status(200)
            .header("link", common::next_link(&server, "/v1/items?cursor=p2"))
            .json_body(json!({"items": [{"id": 1}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("cursor", "p2");
        then.status(403)
            .json_body(json!({"message": "Forbidden", "trackingId": "T1"}));
    });

    let session = common::session(&server);
    let results: Vec<Result<Item, SdkError>> = session
        .follow_pagination(
            &session.ep("items"),
            Some(QueryParams::new().set("max", 2_u32)),
            Some("items"),
        )
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(*results[0].as_ref().unwrap(), Item { id: 1 });
    let rest = results[1].as_ref().unwrap_err().rest().unwrap();
    assert_eq!(rest.status, http::StatusCode::FORBIDDEN);
    assert_eq!(rest.tracking_id.as_deref(), Some("T1"));
}

#[tokio::test]
async fn pages_stream_groups_items() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("max", "2");
        then.status(200)
            .header("link", common::next_link(&server, "/v1/items?cursor=p2"))
            .json_body(json!({"items": [{"id": 1}, {"id": 2}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/items").query_param("cursor", "p2");
        then.status(200).json_body(json!({"items": [{"id": 3}]}));
    });

    let session = common::session(&server);
    let pages: Vec<Vec<Item>> = session
        .follow_pagination_pages(
            &session.ep("items"),
            Some(QueryParams::new().set("max", 2_u32)),
            Some("items"),
        )
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].len(), 2);
    assert_eq!(pages[1], [Item { id: 3 }]);
}
