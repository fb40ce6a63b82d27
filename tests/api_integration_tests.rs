//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, including retries
//! that must be answered from the replay caches.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use replay_cache::{
    api::create_router,
    auth::{CustomAuthenticationProvider, SimpleAuthenticationProvider},
    namespace::Namespace,
    AppState, ReplayCache,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_state() -> AppState {
    AppState::new(
        Namespace::new(),
        ReplayCache::default(),
        ReplayCache::default(),
        Arc::new(SimpleAuthenticationProvider),
    )
}

fn create_test_app() -> Router {
    create_router(create_test_state())
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn rpc(uri: &str, request_id: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(id) = request_id {
        builder = builder.header("x-request-id", id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

// == Create Endpoint Tests ==

#[tokio::test]
async fn test_create_file_success() {
    let app = create_test_app();

    let response = send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["path"], "/a");
    assert_eq!(json["id"], 1);
}

#[tokio::test]
async fn test_create_retry_returns_same_file() {
    let app = create_test_app();

    let first = send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;
    let retry = send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(retry.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(first.into_body()).await,
        body_to_json(retry.into_body()).await
    );
}

#[tokio::test]
async fn test_create_fresh_request_id_conflicts() {
    let app = create_test_app();

    send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;
    let response = send(&app, rpc("/files", Some("c2"), r#"{"path":"/a"}"#)).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["code"], "FileAlreadyExists");
    assert_eq!(json["kind"], "domain");
}

#[tokio::test]
async fn test_create_failure_is_replayed() {
    let app = create_test_app();

    let first = send(&app, rpc("/files", Some("bad"), r#"{"path":"relative"}"#)).await;
    let retry = send(&app, rpc("/files", Some("bad"), r#"{"path":"relative"}"#)).await;

    assert_eq!(first.status(), StatusCode::CONFLICT);
    assert_eq!(retry.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_to_json(first.into_body()).await,
        body_to_json(retry.into_body()).await
    );
}

#[tokio::test]
async fn test_create_missing_request_id() {
    let app = create_test_app();

    let response = send(&app, rpc("/files", None, r#"{"path":"/a"}"#)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("x-request-id"));
}

#[tokio::test]
async fn test_create_empty_path() {
    let app = create_test_app();

    let response = send(&app, rpc("/files", Some("c1"), r#"{"path":""}"#)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_invalid_json() {
    let app = create_test_app();

    let response = send(&app, rpc("/files", Some("c1"), "not json")).await;

    assert!(response.status().is_client_error());
}

// == Rename Endpoint Tests ==

#[tokio::test]
async fn test_rename_retry_is_not_reexecuted() {
    let app = create_test_app();
    send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;

    let body = r#"{"src":"/a","dst":"/b"}"#;
    let first = send(&app, rpc("/files/rename", Some("m1"), body)).await;
    // Re-executing would fail: /a no longer exists
    let retry = send(&app, rpc("/files/rename", Some("m1"), body)).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(retry.status(), StatusCode::OK);
    assert_eq!(body_to_json(retry.into_body()).await["path"], "/b");
}

#[tokio::test]
async fn test_rename_io_failure_is_distinct() {
    let state = AppState::new(
        Namespace::with_journal("/nonexistent-replay-dir/journal.log"),
        ReplayCache::default(),
        ReplayCache::default(),
        Arc::new(SimpleAuthenticationProvider),
    );
    let app = create_router(state);
    send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;

    let response = send(&app, rpc("/files/rename", Some("m1"), r#"{"src":"/a","dst":"/b"}"#)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"], "io");
}

// == Authentication Tests ==

fn custom_auth_app() -> Router {
    let users = HashMap::from([("alice".to_string(), "secret".to_string())]);
    create_router(AppState::new(
        Namespace::new(),
        ReplayCache::default(),
        ReplayCache::default(),
        Arc::new(CustomAuthenticationProvider::new(users)),
    ))
}

#[tokio::test]
async fn test_unauthenticated_caller_rejected() {
    let app = custom_auth_app();

    let mut request = rpc("/files", Some("c1"), r#"{"path":"/a"}"#);
    request
        .headers_mut()
        .insert("x-auth-user", "eve".parse().unwrap());
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticated_caller_accepted() {
    let app = custom_auth_app();

    let mut request = rpc("/files", Some("c1"), r#"{"path":"/a"}"#);
    let headers = request.headers_mut();
    headers.insert("x-auth-user", "alice".parse().unwrap());
    headers.insert("x-auth-credential", "secret".parse().unwrap());
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

// == Stats & Health Tests ==

#[tokio::test]
async fn test_stats_reflect_replays() {
    let app = create_test_app();
    send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;
    send(&app, rpc("/files", Some("c1"), r#"{"path":"/a"}"#)).await;

    let response = send(
        &app,
        Request::builder().uri("/stats").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["create_file"]["executions"], 1);
    assert_eq!(json["create_file"]["hits"], 1);
    assert_eq!(json["create_file"]["entries"], 1);
    assert_eq!(json["files"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app();

    let response = send(
        &app,
        Request::builder().uri("/nope").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
