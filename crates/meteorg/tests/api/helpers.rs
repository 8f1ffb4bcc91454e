use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use feeds::{DmcCredentials, FeatureCollection, FeedSource};
use meteorg::{
    app, parse_allowed_origin,
    secrets::{self, SecretStore},
    AppState, FeedCache,
};
use mockall::mock;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

pub const FIRMS_AREA: &str = "-80,-60,-60,-15";
pub const ALLOWED_ORIGIN: &str = "https://meteorg-474500.web.app";

mock! {
    pub Feeds {}
    #[async_trait]
    impl FeedSource for Feeds {
        async fn stations(&self, credentials: &DmcCredentials) -> Result<FeatureCollection, feeds::Error>;
        async fn firms(&self, map_key: &str, area: &str) -> Result<FeatureCollection, feeds::Error>;
    }
}

mock! {
    pub Secrets {}
    #[async_trait]
    impl SecretStore for Secrets {
        async fn get_secret(&self, name: &str) -> Result<String, secrets::Error>;
    }
}

pub struct TestApp {
    pub app: Router,
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request.")
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn spawn_app(feeds: MockFeeds, secrets: MockSecrets) -> TestApp {
    spawn_app_with_ttl(feeds, secrets, Duration::from_secs(300)).await
}

pub async fn spawn_app_with_ttl(
    feeds: MockFeeds,
    secrets: MockSecrets,
    ttl: Duration,
) -> TestApp {
    let app_state = AppState {
        cache: FeedCache::new(ttl),
        feeds: Arc::new(feeds),
        secrets: Arc::new(secrets),
        firms_area: FIRMS_AREA.to_string(),
        allowed_origin: parse_allowed_origin(ALLOWED_ORIGIN).unwrap(),
    };
    TestApp { app: app(app_state) }
}

/// Every secret resolves to `<name>-value`.
pub fn known_secrets() -> MockSecrets {
    let mut secrets = MockSecrets::new();
    secrets
        .expect_get_secret()
        .returning(|name: &str| Ok(format!("{}-value", name)));
    secrets
}

pub fn station_collection() -> FeatureCollection {
    let feature = feeds::Feature::point(
        None,
        -70.6828,
        -33.4447,
        &json!({
            "nombreEstacion": "Quinta Normal, Santiago",
            "altura": 527.0,
            "institucion_sigla": "DMC",
            "aguaCaida24Horas": 0.0,
            "temperatura": 28.4,
            "humedadRelativa": 31.0,
            "fuerzaDelViento_kmh": 18.5,
            "direccionDelViento": "s/i",
            "momento": "2024-01-05T12:00:00",
            "id": "1"
        }),
    )
    .unwrap();
    FeatureCollection::new(vec![feature])
}

pub fn hotspot_collection() -> FeatureCollection {
    let feature = feeds::Feature::point(
        Some("0".to_string()),
        -72.0433,
        -36.5021,
        &json!({
            "brightness": 331.4,
            "confidence": 78,
            "acq_date": "2024-01-05",
            "acq_time": "0930",
            "satellite": "Terra",
            "daynight": "D",
            "time": "2024-01-05T09:30:00Z"
        }),
    )
    .unwrap();
    FeatureCollection::new(vec![feature])
}
