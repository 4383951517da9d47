#![allow(clippy::unwrap_used)]
// End-to-end tests of the discovery endpoint against a wiremock controller.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use unifi_sd::{Discoverer, server};
use unifi_sd_config::ConfigFile;

const BLACKBOX: &str = "http://blackbox:9115";

// ── Helpers ─────────────────────────────────────────────────────────

fn discoverer(server: &MockServer, session_ttl_secs: Option<u64>) -> Arc<Discoverer> {
    let file = ConfigFile {
        unifi_url: server.uri(),
        blackbox_url: BLACKBOX.into(),
        site: "default".into(),
        username: "prometheus".into(),
        password: "hunter2".into(),
        listen_port: 9999,
        insecure_https: false,
        timeout_secs: Some(5),
        session_ttl_secs,
    };
    Arc::new(Discoverer::from_config(&file.validate().unwrap()).unwrap())
}

async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "unifises=abc123; Path=/"),
        )
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_devices(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .and(header_matcher("cookie", "unifises=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Issue one request against the router; returns status, content type, body.
async fn request(
    discoverer: &Arc<Discoverer>,
    method: &str,
    uri: &str,
) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = server::router(Arc::clone(discoverer))
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_owned());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, body)
}

// ── Success paths ───────────────────────────────────────────────────

#[tokio::test]
async fn test_one_entry_per_device() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_devices(
        &server,
        json!({
            "meta": { "rc": "ok" },
            "data": [
                { "name": "Gateway", "ip": "10.0.0.1", "type": "ugw", "model": "UGW3", "mac": "aa:aa" },
                { "name": "Switch-24", "ip": "10.0.0.2", "type": "usw", "model": "US24" },
                { "name": "AP-Lobby", "ip": "10.0.0.3", "type": "uap", "model": "U7PG2" }
            ]
        }),
    )
    .await;

    let (status, content_type, body) = request(&discoverer(&server, None), "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let document: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        document,
        json!([
            {
                "targets": ["http://blackbox:9115/probe?module=icmp&target=10.0.0.1"],
                "labels": { "ip": "10.0.0.1", "name": "Gateway", "type": "ugw", "model": "UGW3" }
            },
            {
                "targets": ["http://blackbox:9115/probe?module=icmp&target=10.0.0.2"],
                "labels": { "ip": "10.0.0.2", "name": "Switch-24", "type": "usw", "model": "US24" }
            },
            {
                "targets": ["http://blackbox:9115/probe?module=icmp&target=10.0.0.3"],
                "labels": { "ip": "10.0.0.3", "name": "AP-Lobby", "type": "uap", "model": "U7PG2" }
            }
        ])
    );
}

#[tokio::test]
async fn test_capitalized_inventory_keys() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_devices(
        &server,
        json!({ "Data": [{ "Name": "nas", "Ip": "10.0.0.20", "Type": "ugw", "Model": "UXG" }] }),
    )
    .await;

    let (status, _, body) = request(&discoverer(&server, None), "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    let document: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(document[0]["labels"]["name"], "nas");
    assert_eq!(
        document[0]["targets"][0],
        "http://blackbox:9115/probe?module=icmp&target=10.0.0.20"
    );
}

#[tokio::test]
async fn test_empty_inventory() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_devices(&server, json!({ "Data": [] })).await;

    let (status, content_type, body) = request(&discoverer(&server, None), "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(String::from_utf8(body).unwrap().trim_end(), "[]");
}

#[tokio::test]
async fn test_method_is_not_restricted() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_devices(&server, json!({ "data": [] })).await;

    let (status, _, _) = request(&discoverer(&server, None), "POST", "/").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    mount_devices(
        &server,
        json!({ "data": [
            { "name": "Switch-24", "ip": "10.0.0.2", "type": "usw", "model": "US24" },
            { "name": "AP-Lobby", "ip": "10.0.0.3", "type": "uap", "model": "U7PG2" }
        ] }),
    )
    .await;
    let discoverer = discoverer(&server, None);

    let (_, _, first) = request(&discoverer, "GET", "/").await;
    let (_, _, second) = request(&discoverer, "GET", "/").await;

    assert_eq!(first, second);
}

// ── Failure paths ───────────────────────────────────────────────────

#[tokio::test]
async fn test_login_failure_is_bad_gateway_with_controller_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"meta":{"rc":"error","msg":"api.err.Invalid"},"data":[]}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let (status, content_type, body) = request(&discoverer(&server, None), "GET", "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["kind"], "auth");
    let message = error["error"].as_str().unwrap();
    assert!(message.contains("api.err.Invalid"), "body missing from: {message}");
}

#[tokio::test]
async fn test_malformed_inventory_is_fetch_error() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": [{"name": "#))
        .mount(&server)
        .await;

    let (status, _, body) = request(&discoverer(&server, None), "GET", "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert!(error.is_object(), "expected an error object, got: {error}");
    assert_eq!(error["kind"], "fetch");
}

#[tokio::test]
async fn test_inventory_status_error() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let (status, _, body) = request(&discoverer(&server, None), "GET", "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["kind"], "fetch");
    assert!(error["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_failure_does_not_affect_next_request() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_devices(&server, json!({ "data": [] })).await;
    let discoverer = discoverer(&server, None);

    let (first, _, _) = request(&discoverer, "GET", "/").await;
    let (second, _, _) = request(&discoverer, "GET", "/").await;

    assert_eq!(first, StatusCode::BAD_GATEWAY);
    assert_eq!(second, StatusCode::OK);
}

#[tokio::test]
async fn test_any_path_serves_document() {
    let server = MockServer::start().await;
    mount_login(&server, 3).await;
    mount_devices(&server, json!({ "data": [] })).await;
    let discoverer = discoverer(&server, None);

    for uri in ["/", "/targets", "/sd/unifi"] {
        let (status, _, body) = request(&discoverer, "GET", uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, b"[]\n", "{uri}");
    }
}

// ── Session cache ───────────────────────────────────────────────────

#[tokio::test]
async fn test_cached_session_skips_login() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_devices(&server, json!({ "data": [] })).await;
    let discoverer = discoverer(&server, Some(300));

    let (first, _, _) = request(&discoverer, "GET", "/").await;
    let (second, _, _) = request(&discoverer, "GET", "/").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_session_is_dropped_from_cache() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_devices(&server, json!({ "data": [] })).await;
    let discoverer = discoverer(&server, Some(300));

    let (first, _, body) = request(&discoverer, "GET", "/").await;
    let (second, _, _) = request(&discoverer, "GET", "/").await;

    assert_eq!(first, StatusCode::BAD_GATEWAY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["kind"], "fetch");
    assert_eq!(second, StatusCode::OK);
}
