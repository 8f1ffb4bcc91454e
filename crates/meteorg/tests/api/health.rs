use crate::helpers::{body_json, spawn_app, MockFeeds, MockSecrets};
use axum::body::to_bytes;
use hyper::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_reports_ok_without_touching_upstreams() {
    let mut feeds = MockFeeds::new();
    feeds.expect_stations().never();
    feeds.expect_firms().never();
    let mut secrets = MockSecrets::new();
    secrets.expect_get_secret().never();
    let test_app = spawn_app(feeds, secrets).await;

    let response = test_app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "OK"}));
}

#[tokio::test]
async fn docs_are_served() {
    let test_app = spawn_app(MockFeeds::new(), MockSecrets::new()).await;

    let response = test_app.get("/docs").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8_lossy(&body);
    assert!(page.contains("/stations"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let test_app = spawn_app(MockFeeds::new(), MockSecrets::new()).await;
    let response = test_app.get("/observations").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
