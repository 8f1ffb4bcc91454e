use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use time::{macros::format_description, PrimitiveDateTime};

use crate::{normalize::UTC_TIMESTAMP, Error, Feature, FeatureCollection, Fetcher};

/// Near-real-time MODIS detections.
pub const FIRMS_SOURCE: &str = "MODIS_NRT";
/// Days of detections requested.
pub const FIRMS_DAY_RANGE: u8 = 1;

const REQUIRED_COLUMNS: [&str; 4] = ["latitude", "longitude", "acq_date", "acq_time"];

#[derive(Debug, Deserialize)]
struct HotspotRecord {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    brightness: Option<f64>,
    /// Numeric for MODIS, a class letter for VIIRS.
    #[serde(default)]
    confidence: Option<String>,
    acq_date: String,
    acq_time: String,
    #[serde(default)]
    satellite: Option<String>,
    #[serde(default)]
    daynight: Option<String>,
}

#[derive(Debug, Serialize)]
struct HotspotProperties {
    brightness: Option<f64>,
    confidence: Value,
    acq_date: String,
    acq_time: String,
    satellite: Option<String>,
    daynight: Option<String>,
    time: String,
}

/// `"930"` becomes `"0930"`.
pub fn pad_acq_time(raw: &str) -> String {
    format!("{:0>4}", raw)
}

/// Combines `acq_date` and a padded `acq_time` into a UTC timestamp string.
pub fn detection_time(acq_date: &str, acq_time: &str) -> Option<String> {
    let raw = format!("{} {}", acq_date, acq_time);
    PrimitiveDateTime::parse(&raw, format_description!("[year]-[month]-[day] [hour][minute]"))
        .ok()
        .and_then(|t| t.assume_utc().format(UTC_TIMESTAMP).ok())
}

fn confidence_value(raw: Option<String>) -> Value {
    match raw {
        None => Value::Null,
        Some(text) => match text.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => text
                .parse::<f64>()
                .ok()
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .unwrap_or(Value::String(text)),
        },
    }
}

impl HotspotRecord {
    fn into_feature(self, index: usize) -> Result<Option<Feature>, Error> {
        let acq_time = pad_acq_time(&self.acq_time);
        let Some(time) = detection_time(&self.acq_date, &acq_time) else {
            debug!(
                "dropping hotspot {} with bad acquisition time {} {}",
                index, self.acq_date, acq_time
            );
            return Ok(None);
        };
        let properties = HotspotProperties {
            brightness: self.brightness,
            confidence: confidence_value(self.confidence),
            acq_date: self.acq_date,
            acq_time,
            satellite: self.satellite,
            daynight: self.daynight,
            time,
        };
        Feature::point(
            Some(index.to_string()),
            self.longitude,
            self.latitude,
            &properties,
        )
        .map(Some)
    }
}

/// Converts a FIRMS area CSV into point features.
///
/// Rows with an unparseable acquisition time or undecodable columns are
/// skipped. Feature ids are the zero-based CSV row numbers.
pub fn parse_hotspots(body: &str) -> Result<FeatureCollection, Error> {
    if body.trim().is_empty() {
        return Ok(FeatureCollection::default());
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing.join(", ")));
    }

    let mut features = Vec::new();
    for (index, record) in reader.deserialize::<HotspotRecord>().enumerate() {
        match record {
            Ok(record) => features.extend(record.into_feature(index)?),
            Err(e) => warn!("skipping undecodable hotspot row {}: {}", index, e),
        }
    }
    Ok(FeatureCollection::new(features))
}

pub struct FirmsSource {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl FirmsSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: impl Into<String>) -> Self {
        FirmsSource {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn area_url(&self, map_key: &str, area: &str) -> String {
        format!(
            "{}/api/area/csv/{}/{}/{}/{}",
            self.base_url, map_key, FIRMS_SOURCE, area, FIRMS_DAY_RANGE
        )
    }

    /// Active fire detections inside `area` (`west,south,east,north`).
    pub async fn fetch(&self, map_key: &str, area: &str) -> Result<FeatureCollection, Error> {
        let url = self.area_url(map_key, area);
        debug!("fetching FIRMS detections for area {}", area);
        let body = self
            .fetcher
            .fetch_text(&url)
            .await
            .map_err(|e| e.redact(map_key))?;

        let hotspots = parse_hotspots(&body)?;
        info!("loaded FIRMS data: {} hotspots", hotspots.len());
        Ok(hotspots)
    }
}
