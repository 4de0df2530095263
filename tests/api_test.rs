//! Integration tests for the HTTP router

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use folder_priority::api::{router, AppState, ConfigSource};
use folder_priority::PriorityConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let config = PriorityConfig::default()
        .with_rules("Guides:1;Manuals:5")
        .with_default_priority(9999);
    router(Arc::new(AppState::new(ConfigSource::Fixed(config))))
}

async fn post(app: Router, body: &'static str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/priority")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_classify_envelope() {
    let (status, body) = post(
        app(),
        r#"{"values":[{"recordId":"1","data":{"storagePath":"/a/Manuals/x"}},{"recordId":"2","data":{}}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        value,
        json!({"values": [
            {"recordId": "1", "data": {"storagePath": "/a/Manuals/x", "priority": 5}},
            {"recordId": "2", "data": {"priority": 9999}}
        ]})
    );
}

#[tokio::test]
async fn test_classify_bare_object() {
    let (status, body) = post(app(), r#"{"recordId":"42","blobUri":"https://h/c/guides/f"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["values"][0]["recordId"], "42");
    assert_eq!(value["values"][0]["data"]["priority"], 1);
}

#[tokio::test]
async fn test_unparseable_body_is_plain_text_400() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/priority")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("record batch"));
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_configuration() {
    let response = app()
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["strategy"], "substring");
    assert_eq!(value["rules"], 2);
    assert_eq!(value["default_priority"], 9999);
}
