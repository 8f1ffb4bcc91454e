use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
}

/// Liveness only, upstream services are not contacted.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = OK, description = "Service is running", body = HealthStatus)
    ))]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: String::from("OK"),
    })
}
