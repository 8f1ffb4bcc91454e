use crate::{
    get_firms, get_stations, health, routes,
    secrets::{EnvSecrets, SecretManager, SecretStore, SecretsBackend},
    Cli, ErrorBody, FeedCache,
};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use feeds::{FeedSource, Feeds, HttpFetcher};
use log::info;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub struct AppState {
    pub cache: FeedCache,
    pub feeds: Arc<dyn FeedSource>,
    pub secrets: Arc<dyn SecretStore>,
    pub firms_area: String,
    /// `None` lets any origin in, without credentials.
    pub allowed_origin: Option<HeaderValue>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::feed_routes::get_stations,
        routes::feed_routes::get_firms,
        routes::health::health,
    ),
    components(
        schemas(
                routes::feed_routes::FeedEnvelope,
                routes::health::HealthStatus,
                ErrorBody
            )
    ),
    tags(
        (name = "meteorg feed api", description = "cached GeoJSON feeds of Chilean weather stations and NASA FIRMS fire detections")
    )
)]
struct ApiDoc;

/// Parses the configured origin; `*` means any origin.
pub fn parse_allowed_origin(origin: &str) -> Result<Option<HeaderValue>, anyhow::Error> {
    if origin.trim() == "*" {
        return Ok(None);
    }
    HeaderValue::from_str(origin.trim())
        .map(Some)
        .map_err(|e| anyhow!("invalid allowed origin {}: {}", origin, e))
}

pub async fn build_app_state(cli: &Cli) -> Result<AppState, anyhow::Error> {
    let fetcher = Arc::new(
        HttpFetcher::new(&cli.user_agent(), cli.upstream_timeout())
            .map_err(|e| anyhow!("error setting up http client: {}", e))?,
    );
    let feeds = Arc::new(Feeds::new(fetcher, &cli.endpoints()));

    let secrets: Arc<dyn SecretStore> = match cli.secrets_backend()? {
        SecretsBackend::Gcp => {
            let project = cli
                .gcp_project
                .clone()
                .ok_or_else(|| anyhow!("GCP_PROJECT must be set to use the gcp secrets backend"))?;
            let client = reqwest::Client::builder()
                .timeout(cli.upstream_timeout())
                .build()
                .map_err(|e| anyhow!("error setting up secret manager client: {}", e))?;
            Arc::new(SecretManager::new(client, project))
        }
        SecretsBackend::Env => Arc::new(EnvSecrets),
    };

    Ok(AppState {
        cache: FeedCache::new(cli.cache_ttl()),
        feeds,
        secrets,
        firms_area: cli.firms_area(),
        allowed_origin: parse_allowed_origin(&cli.allowed_origin())?,
    })
}

fn cors_layer(allowed_origin: Option<HeaderValue>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    match allowed_origin {
        // only a matching request origin is echoed back
        Some(origin) => cors
            .allow_origin(AllowOrigin::list([origin]))
            .allow_credentials(true),
        None => cors.allow_origin(Any),
    }
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = cors_layer(app_state.allowed_origin.clone());

    Router::new()
        .route("/stations", get(get_stations))
        .route("/firms", get(get_firms))
        .route("/health", get(health))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
