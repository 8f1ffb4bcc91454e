use axum::{extract::State, Json};
use feeds::{normalize::UTC_TIMESTAMP, DmcCredentials, FeatureCollection};
use meteorg_core::secret_names;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{secrets::SecretStore, AppState, Cached, Error, ErrorBody, Feed};

/// A feed together with the UTC time it was fetched upstream.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedEnvelope {
    /// `YYYY-MM-DDTHH:MM:SSZ`
    pub last_update: String,
    /// GeoJSON FeatureCollection of point features
    #[schema(value_type = Object)]
    pub geojson: Arc<FeatureCollection>,
}

impl TryFrom<Cached> for FeedEnvelope {
    type Error = Error;

    fn try_from(cached: Cached) -> Result<Self, Self::Error> {
        Ok(FeedEnvelope {
            last_update: cached.last_update.format(UTC_TIMESTAMP)?,
            geojson: cached.payload,
        })
    }
}

async fn dmc_credentials(secrets: &dyn SecretStore) -> Result<DmcCredentials, Error> {
    Ok(DmcCredentials {
        user: secrets.get_secret(secret_names::DMC_USER).await?,
        api_key: secrets.get_secret(secret_names::DMC_API_KEY).await?,
    })
}

#[utoipa::path(
    get,
    path = "/stations",
    responses(
        (status = OK, description = "Latest reading of every station in both networks, as GeoJSON", body = FeedEnvelope),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to refresh the station feed", body = ErrorBody)
    ))]
pub async fn get_stations(State(state): State<Arc<AppState>>) -> Result<Json<FeedEnvelope>, Error> {
    let AppState {
        cache,
        feeds,
        secrets,
        ..
    } = state.as_ref();
    let cached = cache
        .get_or_refresh(Feed::Stations, move || async move {
            let credentials = dmc_credentials(secrets.as_ref()).await?;
            let geojson = feeds.stations(&credentials).await?;
            Ok::<_, Error>(geojson)
        })
        .await?;

    Ok(Json(FeedEnvelope::try_from(cached)?))
}

#[utoipa::path(
    get,
    path = "/firms",
    responses(
        (status = OK, description = "Active fire detections from the last day, as GeoJSON", body = FeedEnvelope),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to refresh the fire feed", body = ErrorBody)
    ))]
pub async fn get_firms(State(state): State<Arc<AppState>>) -> Result<Json<FeedEnvelope>, Error> {
    let AppState {
        cache,
        feeds,
        secrets,
        firms_area,
        ..
    } = state.as_ref();
    let cached = cache
        .get_or_refresh(Feed::Firms, move || async move {
            let map_key = secrets.get_secret(secret_names::FIRMS_MAP_KEY).await?;
            let geojson = feeds.firms(&map_key, firms_area).await?;
            Ok::<_, Error>(geojson)
        })
        .await?;

    Ok(Json(FeedEnvelope::try_from(cached)?))
}
