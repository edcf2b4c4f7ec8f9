mod common;

use futures_util::TryStreamExt;
use httpmock::prelude::*;
use serde_json::json;
use wxc_sdk::WebexSimpleApi;
use wxc_sdk::api::devices::{ActivationState, ConnectionStatus, ListDevices};
use wxc_sdk::api::locations::Location;
use wxc_sdk::api::people::{ListPeople, Person, PersonType};

fn api(server: &MockServer) -> WebexSimpleApi {
    WebexSimpleApi::new(common::session(server))
}

#[tokio::test]
async fn people_list_and_me() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/people")
            .query_param("email", "alice@example.com")
            .query_param("callingData", "true");
        then.status(200).json_body(json!({
            "items": [{"id": "p1", "displayName": "Alice", "type": "person"}]
        }));
    });
    let me = server.mock(|when, then| {
        when.method(GET).path("/v1/people/me");
        then.status(200)
            .json_body(json!({"id": "p0", "emails": ["me@example.com"]}));
    });

    let api = api(&server);
    let people: Vec<Person> = api
        .people
        .list(&ListPeople {
            email: Some("alice@example.com".into()),
            calling_data: true,
            ..ListPeople::default()
        })
        .try_collect()
        .await
        .unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].display_name.as_deref(), Some("Alice"));
    assert_eq!(people[0].person_type, Some(PersonType::Person));

    let myself = api.people.me(false).await.unwrap();
    assert_eq!(myself.emails, Some(vec!["me@example.com".to_owned()]));
    list.assert();
    me.assert();
}

#[tokio::test]
async fn people_update_sends_only_set_fields() {
    let server = MockServer::start();
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/v1/people/p1")
            .query_param("callingData", "true")
            .json_body(json!({"displayName": "Alice B."}));
        then.status(200)
            .json_body(json!({"id": "p1", "displayName": "Alice B."}));
    });

    let api = api(&server);
    let settings = Person {
        display_name: Some("Alice B.".into()),
        ..Person::default()
    };
    let updated = api.people.update("p1", &settings, true, false).await.unwrap();
    assert_eq!(updated.display_name.as_deref(), Some("Alice B."));
    update.assert();
}

#[tokio::test]
async fn people_delete_accepts_no_content() {
    let server = MockServer::start();
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/v1/people/p1");
        then.status(204);
    });

    api(&server).people.delete("p1").await.unwrap();
    delete.assert();
}

#[tokio::test]
async fn location_create_returns_id() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/locations")
            .query_param("orgId", "O1")
            .json_body(json!({"name": "HQ", "timeZone": "Europe/Berlin"}));
        then.status(200).json_body(json!({"id": "L1"}));
    });

    let settings = Location {
        name: Some("HQ".into()),
        time_zone: Some("Europe/Berlin".into()),
        ..Location::default()
    };
    let id = api(&server)
        .locations
        .create(&settings, Some("O1"))
        .await
        .unwrap();
    assert_eq!(id, "L1");
    create.assert();
}

#[tokio::test]
async fn license_details() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/licenses/LIC1");
        then.status(200)
            .json_body(json!({"id": "LIC1", "totalUnits": 10, "consumedUnits": 3}));
    });

    let license = api(&server).licenses.details("LIC1").await.unwrap();
    assert_eq!(license.total_units, Some(10));
    assert_eq!(license.consumed_units, Some(3));
}

#[tokio::test]
async fn devices_list_and_activation_code() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/devices")
            .query_param("connectionStatus", "connected");
        then.status(200).json_body(json!({"items": [{
            "id": "D1",
            "activationState": "activated",
            "connectionStatus": "connected"
        }]}));
    });
    let code = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/devices/activationCode")
            .json_body(json!({"workspaceId": "W1", "model": "DMS Cisco 8865"}));
        then.status(200).json_body(json!({
            "code": "5414011256173816",
            "expiryTime": "2024-05-02T00:00:00.000Z"
        }));
    });

    let api = api(&server);
    let devices: Vec<_> = api
        .devices
        .list(&ListDevices {
            connection_status: Some(ConnectionStatus::Connected),
            ..ListDevices::default()
        })
        .try_collect()
        .await
        .unwrap();
    assert_eq!(devices[0].states.activation_state, Some(ActivationState::Activated));

    let activation = api
        .devices
        .activation_code(Some("W1"), None, Some("DMS Cisco 8865"), None)
        .await
        .unwrap();
    assert_eq!(activation.code.as_deref(), Some("5414011256173816"));
    list.assert();
    code.assert();
}

#[tokio::test]
async fn rest_error_from_endpoint() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/devices/D404");
        then.status(404)
            .header("trackingid", "ROUTER_404")
            .json_body(json!({
                "message": "Device not found",
                "errors": [{"description": "Unknown device id", "errorCode": 4404}]
            }));
    });

    let err = api(&server).devices.details("D404", None).await.unwrap_err();
    let rest = err.rest().unwrap();
    assert_eq!(rest.code(), Some(4404));
    assert_eq!(rest.tracking_id.as_deref(), Some("ROUTER_404"));
    assert_eq!(rest.description(), "Device not found: Unknown device id");
}
