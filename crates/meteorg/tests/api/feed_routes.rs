use crate::helpers::{
    body_json, hotspot_collection, known_secrets, spawn_app, spawn_app_with_ttl,
    station_collection, MockFeeds, MockSecrets, ALLOWED_ORIGIN, FIRMS_AREA,
};
use axum::{body::Body, http::Request};
use feeds::{DmcCredentials, Error as FeedError, FetchError};
use hyper::{header, Method, StatusCode};
use meteorg::secrets::Error as SecretError;
use serde_json::json;
use std::time::Duration;

fn is_utc_timestamp(value: &str) -> bool {
    value.len() == 20 && value.ends_with('Z') && value.as_bytes()[10] == b'T'
}

#[tokio::test]
async fn stations_returns_envelope_with_geojson() {
    let mut feeds = MockFeeds::new();
    feeds
        .expect_stations()
        .withf(|credentials: &DmcCredentials| {
            credentials.user == "USER_DMC-value" && credentials.api_key == "DMC_API_KEY-value"
        })
        .times(1)
        .returning(|_| Ok(station_collection()));
    let test_app = spawn_app(feeds, known_secrets()).await;

    let response = test_app.get("/stations").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(is_utc_timestamp(body["last_update"].as_str().unwrap()));
    assert_eq!(body["geojson"]["type"], json!("FeatureCollection"));
    let feature = &body["geojson"]["features"][0];
    assert_eq!(feature["type"], json!("Feature"));
    assert_eq!(
        feature["geometry"],
        json!({"type": "Point", "coordinates": [-70.6828, -33.4447]})
    );
    assert_eq!(feature["properties"]["id"], json!("1"));
    assert_eq!(feature["properties"]["direccionDelViento"], json!("s/i"));
}

#[tokio::test]
async fn second_request_within_ttl_is_served_from_cache() {
    let mut feeds = MockFeeds::new();
    feeds
        .expect_stations()
        .times(1)
        .returning(|_| Ok(station_collection()));
    let test_app = spawn_app(feeds, known_secrets()).await;

    let first = body_json(test_app.get("/stations").await).await;
    let second = body_json(test_app.get("/stations").await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn expired_feed_is_fetched_again() {
    let mut feeds = MockFeeds::new();
    feeds
        .expect_firms()
        .times(2)
        .returning(|_, _| Ok(hotspot_collection()));
    let test_app = spawn_app_with_ttl(feeds, known_secrets(), Duration::from_millis(50)).await;

    let first = body_json(test_app.get("/firms").await).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let second = body_json(test_app.get("/firms").await).await;

    assert_eq!(first["geojson"], second["geojson"]);
    assert!(second["last_update"].as_str() > first["last_update"].as_str());
}

#[tokio::test]
async fn firms_uses_map_key_and_configured_area() {
    let mut feeds = MockFeeds::new();
    feeds
        .expect_firms()
        .withf(|map_key: &str, area: &str| map_key == "FIRMS_MAP_KEY-value" && area == FIRMS_AREA)
        .times(1)
        .returning(|_, _| Ok(hotspot_collection()));
    let test_app = spawn_app(feeds, known_secrets()).await;

    let response = test_app.get("/firms").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let feature = &body["geojson"]["features"][0];
    assert_eq!(feature["id"], json!("0"));
    assert_eq!(feature["properties"]["time"], json!("2024-01-05T09:30:00Z"));
}

#[tokio::test]
async fn upstream_failure_is_500_and_not_cached() {
    let mut feeds = MockFeeds::new();
    let mut calls = 0;
    feeds.expect_stations().times(2).returning(move |_| {
        calls += 1;
        if calls == 1 {
            Err(FeedError::Fetch(FetchError::Timeout {
                url: "https://climatologia.meteochile.gob.cl/application/servicios".to_string(),
            }))
        } else {
            Ok(station_collection())
        }
    });
    let test_app = spawn_app(feeds, known_secrets()).await;

    let response = test_app.get("/stations").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("timed out"));

    let response = test_app.get("/stations").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_secret_fails_before_any_upstream_call() {
    let mut feeds = MockFeeds::new();
    feeds.expect_stations().never();
    let mut secrets = MockSecrets::new();
    secrets
        .expect_get_secret()
        .returning(|name: &str| Err(SecretError::Missing(name.to_string())));
    let test_app = spawn_app(feeds, secrets).await;

    let response = test_app.get("/stations").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body, json!({"error": "Secret USER_DMC is not set"}));
}

#[tokio::test]
async fn cors_allows_configured_origin_with_credentials() {
    let mut feeds = MockFeeds::new();
    feeds
        .expect_stations()
        .returning(|_| Ok(station_collection()));
    let test_app = spawn_app(feeds, known_secrets()).await;

    let request = Request::builder()
        .uri("/stations")
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let response = test_app.send(request).await;

    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn cors_preflight_mirrors_method_and_headers() {
    let test_app = spawn_app(MockFeeds::new(), MockSecrets::new()).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/firms")
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-requested-with")
        .body(Body::empty())
        .unwrap();
    let response = test_app.send(request).await;

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-requested-with");
}

#[tokio::test]
async fn other_origins_get_no_cors_grant() {
    let test_app = spawn_app(MockFeeds::new(), MockSecrets::new()).await;

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = test_app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
