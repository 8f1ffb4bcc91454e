use log::{debug, info, warn};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::{
    normalize::{normalize_timestamp, parse_value, parse_wind_knots, repair_encoding, value_text},
    Error, Fetcher, Measurements, StationReading,
};

/// Institution code stamped on every primary-network row.
pub const DMC_INSTITUTION: &str = "DMC";

const RECENT_DATA_PATH: &str = "/application/servicios/getDatosRecientesRedEma";

#[derive(Clone)]
pub struct DmcCredentials {
    pub user: String,
    pub api_key: String,
}

impl fmt::Debug for DmcCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DmcCredentials")
            .field("user", &self.user)
            .field("api_key", &"***")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DmcEntry {
    #[serde(rename = "estacion", default)]
    station: Option<DmcStation>,
    /// A single observation object, sometimes wrapped in a list.
    #[serde(rename = "datos", default)]
    observation: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DmcStation {
    #[serde(rename = "nombreEstacion")]
    name: Option<Value>,
    #[serde(rename = "altura")]
    elevation: Option<Value>,
    #[serde(rename = "latitud")]
    latitude: Option<Value>,
    #[serde(rename = "longitud")]
    longitude: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DmcObservation {
    #[serde(rename = "momento")]
    observed_at: Option<Value>,
    #[serde(rename = "temperatura")]
    temperature: Option<Value>,
    #[serde(rename = "humedadRelativa")]
    relative_humidity: Option<Value>,
    #[serde(rename = "aguaCaida24Horas")]
    precipitation_24h: Option<Value>,
    #[serde(rename = "direccionDelViento")]
    wind_direction: Option<Value>,
    /// Knots, e.g. `"10 kt"`.
    #[serde(rename = "fuerzaDelViento")]
    wind_speed: Option<Value>,
}

impl TryFrom<DmcEntry> for StationReading {
    type Error = Error;

    fn try_from(entry: DmcEntry) -> Result<Self, Self::Error> {
        let station = entry.station.unwrap_or_default();
        let observation = match entry.observation {
            Some(Value::Array(items)) => items.into_iter().next(),
            other => other,
        };
        let observation: DmcObservation = match observation {
            Some(value) if !value.is_null() => {
                serde_json::from_value(value).map_err(|e| Error::decode("DMC", e))?
            }
            _ => DmcObservation::default(),
        };

        let name = station
            .name
            .as_ref()
            .and_then(value_text)
            .map(|n| repair_encoding(&n))
            .transpose()?;

        Ok(StationReading {
            name,
            elevation: parse_value(station.elevation.as_ref()),
            latitude: parse_value(station.latitude.as_ref()),
            longitude: parse_value(station.longitude.as_ref()),
            institution: Some(DMC_INSTITUTION.to_string()),
            measurements: Measurements {
                precipitation_24h: parse_value(observation.precipitation_24h.as_ref()),
                temperature: parse_value(observation.temperature.as_ref()),
                relative_humidity: parse_value(observation.relative_humidity.as_ref()),
                wind_speed_kmh: observation
                    .wind_speed
                    .as_ref()
                    .and_then(value_text)
                    .and_then(|w| parse_wind_knots(&w)),
                wind_direction: parse_value(observation.wind_direction.as_ref()),
            },
            observed_at: observation
                .observed_at
                .as_ref()
                .and_then(value_text)
                .and_then(|t| normalize_timestamp(&t)),
        })
    }
}

/// Flattens a `{"datosEstaciones": [...]}` document into readings.
///
/// A missing, null or empty envelope, or a root that is not an object, is a
/// valid "no stations" answer and yields an empty table.
pub fn parse_dmc(body: &str) -> Result<Vec<StationReading>, Error> {
    let root: Value = serde_json::from_str(body).map_err(|e| Error::decode("DMC", e))?;
    let envelope = match root {
        Value::Object(mut map) => map.remove("datosEstaciones").unwrap_or(Value::Null),
        _ => {
            warn!("DMC response root is not an object");
            Value::Null
        }
    };
    if envelope.is_null() {
        warn!("DMC response has no station envelope");
        return Ok(vec![]);
    }

    // Upstream sends a bare object instead of a list when there is one station.
    let entries = match envelope {
        Value::Array(items) => items,
        Value::Object(map) if map.is_empty() => vec![],
        single => vec![single],
    };

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<DmcEntry>(entry)
                .map_err(|e| Error::decode("DMC", e))
                .and_then(StationReading::try_from)
        })
        .collect()
}

pub struct DmcSource {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl DmcSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: impl Into<String>) -> Self {
        DmcSource {
            fetcher,
            base_url: base_url.into(),
        }
    }

    fn recent_data_url(&self, credentials: &DmcCredentials) -> Result<Url, Error> {
        let base = format!("{}{}", self.base_url.trim_end_matches('/'), RECENT_DATA_PATH);
        Url::parse_with_params(
            &base,
            &[
                ("usuario", credentials.user.as_str()),
                ("token", credentials.api_key.as_str()),
            ],
        )
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", base, e)))
    }

    /// Latest reading of every automatic DMC station.
    pub async fn fetch(&self, credentials: &DmcCredentials) -> Result<Vec<StationReading>, Error> {
        let url = self.recent_data_url(credentials)?;
        debug!("fetching DMC recent data");
        let body = self
            .fetcher
            .fetch_text(url.as_str())
            .await
            .map_err(|e| {
                e.redact(url.query().unwrap_or_default())
                    .redact(&credentials.api_key)
            })?;

        let readings = parse_dmc(&body)?;
        if readings.is_empty() {
            warn!("no stations found in DMC data");
        } else {
            info!("loaded DMC data: {} stations", readings.len());
        }
        Ok(readings)
    }
}
