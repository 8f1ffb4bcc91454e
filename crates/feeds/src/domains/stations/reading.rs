use serde::{Serialize, Serializer};
use time::PrimitiveDateTime;

use crate::{normalize::LOCAL_TIMESTAMP, Error, Feature, FeatureCollection};

/// Emitted in place of a measurement a station did not report.
pub const NO_INFO: &str = "s/i";

/// The five variables every station row carries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurements {
    pub precipitation_24h: Option<f64>,
    pub temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction: Option<f64>,
}

impl Measurements {
    pub fn has_any(&self) -> bool {
        self.precipitation_24h.is_some()
            || self.temperature.is_some()
            || self.relative_humidity.is_some()
            || self.wind_speed_kmh.is_some()
            || self.wind_direction.is_some()
    }
}

/// One observation from one station, before reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationReading {
    pub name: Option<String>,
    pub elevation: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub institution: Option<String>,
    pub measurements: Measurements,
    /// Naive Chilean local time.
    pub observed_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Value(f64),
    NoInfo,
}

impl From<Option<f64>> for Measurement {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Measurement::NoInfo, Measurement::Value)
    }
}

impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measurement::Value(v) => serializer.serialize_f64(*v),
            Measurement::NoInfo => serializer.serialize_str(NO_INFO),
        }
    }
}

/// A reconciled station: located, deduplicated, numbered.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: u32,
    pub name: Option<String>,
    pub elevation: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    pub institution: Option<String>,
    pub precipitation_24h: Measurement,
    pub temperature: Measurement,
    pub relative_humidity: Measurement,
    pub wind_speed_kmh: Measurement,
    pub wind_direction: Measurement,
    pub observed_at: Option<PrimitiveDateTime>,
}

// Property names are the ones the map frontend reads.
#[derive(Serialize)]
struct StationProperties<'a> {
    #[serde(rename = "nombreEstacion", skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "altura", skip_serializing_if = "Option::is_none")]
    elevation: Option<f64>,
    #[serde(rename = "institucion_sigla", skip_serializing_if = "Option::is_none")]
    institution: Option<&'a str>,
    #[serde(rename = "aguaCaida24Horas")]
    precipitation_24h: Measurement,
    #[serde(rename = "temperatura")]
    temperature: Measurement,
    #[serde(rename = "humedadRelativa")]
    relative_humidity: Measurement,
    #[serde(rename = "fuerzaDelViento_kmh")]
    wind_speed_kmh: Measurement,
    #[serde(rename = "direccionDelViento")]
    wind_direction: Measurement,
    #[serde(rename = "momento", skip_serializing_if = "Option::is_none")]
    observed_at: Option<String>,
    id: String,
}

impl Station {
    pub fn to_feature(&self) -> Result<Feature, Error> {
        let properties = StationProperties {
            name: self.name.as_deref(),
            elevation: self.elevation,
            institution: self.institution.as_deref(),
            precipitation_24h: self.precipitation_24h,
            temperature: self.temperature,
            relative_humidity: self.relative_humidity,
            wind_speed_kmh: self.wind_speed_kmh,
            wind_direction: self.wind_direction,
            observed_at: self
                .observed_at
                .and_then(|t| t.format(LOCAL_TIMESTAMP).ok()),
            id: self.id.to_string(),
        };
        Feature::point(None, self.longitude, self.latitude, &properties)
    }
}

pub fn stations_to_geojson(stations: &[Station]) -> Result<FeatureCollection, Error> {
    stations
        .iter()
        .map(Station::to_feature)
        .collect::<Result<Vec<_>, _>>()
        .map(FeatureCollection::new)
}
