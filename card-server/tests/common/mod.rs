//! Shared helpers for driving the router in-process.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so every test exercises
//! the same extractors, middleware, and handlers the binary serves without
//! binding a socket.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use card_server::{app, AppState, ServerConfig};

/// Home cook who owns most fixtures.
pub const ALICE: Option<(&str, &str)> = Some(("alice", "home_cook"));
/// Second home cook, never the owner.
pub const BOB: Option<(&str, &str)> = Some(("bob", "home_cook"));
/// Read-only visitor.
pub const GUEST: Option<(&str, &str)> = Some(("visitor", "guest"));
/// Unrestricted chef.
pub const CHEF: Option<(&str, &str)> = Some(("gordon", "chef"));
/// No identity headers at all.
pub const ANONYMOUS: Option<(&str, &str)> = None;

/// Router over fresh in-memory state with default limits.
pub fn test_app() -> Router {
    app(AppState::in_memory())
}

/// Router over in-memory state with custom quota and size limits.
pub fn test_app_with_limits(max_document_bytes: usize, max_documents_per_owner: usize) -> Router {
    let config = ServerConfig {
        max_document_bytes,
        max_documents_per_owner,
        ..ServerConfig::default()
    };
    let state = AppState::from_config(config).expect("in-memory state");
    app(state)
}

/// Build a request with optional identity headers and JSON body.
pub fn request(
    method: Method,
    uri: &str,
    identity: Option<(&str, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = identity {
        builder = builder
            .header("x-user-id", user_id)
            .header("x-user-role", role);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Send a request and decode the response as JSON.
///
/// Empty bodies decode as `Value::Null` so status-only probes work too.
pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

/// Send a request and return status, headers, and raw bytes.
///
/// For export responses, where the body is an image.
pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, headers, bytes.to_vec())
}

/// Create a card as `identity` and return its id.
pub async fn create_card(app: &Router, identity: Option<(&str, &str)>, body: Value) -> String {
    let (status, json) = send_json(
        app,
        request(Method::POST, "/api/cards", identity, Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["card"]["id"]
        .as_str()
        .expect("card id in response")
        .to_string()
}
