#![allow(clippy::unwrap_used)]
// Integration tests for `NetboxClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nbload_api::{Error, NetboxClient, Resource, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NetboxClient) {
    let server = MockServer::start().await;
    let client = NetboxClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn page(results: serde_json::Value) -> serde_json::Value {
    let count = results.as_array().map_or(0, Vec::len);
    json!({ "count": count, "next": null, "previous": null, "results": results })
}

// ── Lookups ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_sends_filters_as_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/device-types/"))
        .and(query_param("model", "C9300"))
        .and(query_param("manufacturer_id", "3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(json!([{ "id": 12, "model": "C9300", "display": "C9300" }]))),
        )
        .mount(&server)
        .await;

    let found = client
        .get(
            Resource::DeviceTypes,
            &[("model", "C9300".into()), ("manufacturer_id", "3".into())],
        )
        .await
        .unwrap()
        .expect("device type should be found");

    assert_eq!(found.id, 12);
    assert_eq!(found.model.as_deref(), Some("C9300"));
}

#[tokio::test]
async fn test_get_returns_none_when_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .and(query_param("name", "Nowhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .mount(&server)
        .await;

    let found = client
        .get(Resource::Sites, &[("name", "Nowhere".into())])
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_get_rejects_multiple_matches() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(json!([{ "id": 1, "name": "sw1" }, { "id": 2, "name": "sw1" }]))),
        )
        .mount(&server)
        .await;

    let result = client
        .get(Resource::Devices, &[("name", "sw1".into())])
        .await;

    assert!(
        matches!(result, Err(Error::Ambiguous { count: 2, .. })),
        "expected Ambiguous error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_asset_with_nested_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/plugins/inventory/assets/"))
        .and(query_param("serial", "ABC123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{
            "id": 40,
            "url": "http://nb/api/plugins/inventory/assets/40/",
            "serial": "ABC123",
            "device": { "id": 7, "name": "sw1" }
        }]))))
        .mount(&server)
        .await;

    let asset = client
        .get(Resource::InventoryAssets, &[("serial", "ABC123".into())])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(asset.device.map(|d| d.id()), Some(7));
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_json_body() {
    let (server, client) = setup().await;

    let body = json!({
        "device": 7,
        "name": "LAN",
        "type": "1000base-t"
    });

    Mock::given(method("POST"))
        .and(path("/api/dcim/interfaces/"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 30,
            "name": "LAN",
            "device": { "id": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create(Resource::Interfaces, &body).await.unwrap();
    assert_eq!(created.id, 30);
    assert_eq!(created.device.map(|d| d.id()), Some(7));
}

#[tokio::test]
async fn test_update_patches_object_path() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/dcim/devices/7/"))
        .and(body_json(json!({ "primary_ip4": 11 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "name": "sw1" })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .update(Resource::Devices, 7, &json!({ "primary_ip4": 11 }))
        .await
        .unwrap();
    assert_eq!(updated.id, 7);
}

// ── Auth & errors ───────────────────────────────────────────────────

#[tokio::test]
async fn test_token_header_is_sent() {
    let server = MockServer::start().await;
    let token = SecretString::from("0123456789abcdef".to_string());
    let client =
        NetboxClient::from_token(&server.uri(), &token, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/dcim/manufacturers/"))
        .and(header("authorization", "Token 0123456789abcdef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{ "id": 3 }]))))
        .expect(1)
        .mount(&server)
        .await;

    let found = client
        .get(Resource::Manufacturers, &[("name", "Cisco".into())])
        .await
        .unwrap();
    assert_eq!(found.map(|m| m.id), Some(3));
}

#[tokio::test]
async fn test_forbidden_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "Invalid token" })),
        )
        .mount(&server)
        .await;

    let result = client.get(Resource::Sites, &[("name", "HQ".into())]).await;
    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "Invalid token"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_error_surfaces_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ipam/ip-addresses/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "address": ["Enter a valid IPv4 or IPv6 address."] })),
        )
        .mount(&server)
        .await;

    let result = client
        .create(Resource::IpAddresses, &json!({ "address": "bogus/24" }))
        .await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("valid IPv4"), "message: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_detail() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/dcim/devices/99/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "No Device matches the given query." })),
        )
        .mount(&server)
        .await;

    let err = client
        .update(Resource::Devices, 99, &json!({ "primary_ip4": 1 }))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("No Device matches"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = client.get(Resource::Sites, &[]).await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("login")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
