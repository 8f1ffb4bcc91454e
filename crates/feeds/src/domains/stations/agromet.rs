use futures::future::join_all;
use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use time::PrimitiveDateTime;

use crate::{
    normalize::{parse_naive_timestamp, parse_number, parse_value, value_text},
    Error, Fetcher, Measurements, StationReading,
};

/// Attribute on the landing page holding the current asset folder.
pub const ASSET_MARKER: &str = "data-ts-map-tmp";

/// Institutions already reported by the primary network.
pub const PRIMARY_INSTITUTIONS: [&str; 2] = ["DMC", "MMA-DMC"];

static ASSET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-ts-map-tmp\s*=\s*["']([^"']*)["']"#).expect("valid asset pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Temperature,
    Precipitation,
    WindSpeed,
    Humidity,
    WindDirection,
}

impl Variable {
    /// Stacking order of the per-variable tables.
    pub const ALL: [Variable; 5] = [
        Variable::Temperature,
        Variable::Precipitation,
        Variable::WindSpeed,
        Variable::Humidity,
        Variable::WindDirection,
    ];

    /// Suffix of the `items-*.json` document carrying this variable.
    pub fn file_key(self) -> &'static str {
        match self {
            Variable::Temperature => "ta",
            Variable::Precipitation => "pp",
            Variable::WindSpeed | Variable::WindDirection => "vv",
            Variable::Humidity => "hr",
        }
    }

    /// Key of the value inside each hourly bucket.
    pub fn json_key(self) -> &'static str {
        match self {
            Variable::Temperature => "TA-AVG",
            Variable::Precipitation => "PP-SUM",
            Variable::WindSpeed => "VV-AVG",
            Variable::Humidity => "HR-AVG",
            Variable::WindDirection => "DV-AVG",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.json_key())
    }
}

#[derive(Debug, Deserialize)]
pub struct AgrometEntry {
    id: Option<Value>,
    #[serde(rename = "nombre")]
    name: Option<Value>,
    #[serde(rename = "latitud")]
    latitude: Option<Value>,
    #[serde(rename = "longitud")]
    longitude: Option<Value>,
    #[serde(rename = "elevacion")]
    elevation: Option<Value>,
    #[serde(rename = "institucion_sigla")]
    institution: Option<Value>,
    /// Hourly timestamp -> `{ "<json key>": value, ... }`.
    #[serde(rename = "STACK-HOUR", default)]
    stack_hour: Option<Value>,
}

/// Station identity, compared on the upstream text of each field except the
/// code, which orders numerically when it is a number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationKey {
    pub code: Option<String>,
    pub name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub institution: Option<String>,
    pub elevation: Option<String>,
}

impl StationKey {
    fn of(entry: &AgrometEntry) -> Self {
        let text = |v: &Option<Value>| v.as_ref().and_then(value_text).map(|s| s.into_owned());
        StationKey {
            code: text(&entry.id),
            name: text(&entry.name),
            latitude: text(&entry.latitude),
            longitude: text(&entry.longitude),
            institution: text(&entry.institution),
            elevation: text(&entry.elevation),
        }
    }

    fn is_primary_network(&self) -> bool {
        self.institution
            .as_deref()
            .is_some_and(|i| PRIMARY_INSTITUTIONS.contains(&i))
    }

    /// Every identity field was reported upstream.
    pub fn is_complete(&self) -> bool {
        self.code.is_some()
            && self.name.is_some()
            && self.latitude.is_some()
            && self.longitude.is_some()
            && self.institution.is_some()
            && self.elevation.is_some()
    }

    fn code_order(&self) -> Option<CodeOrder<'_>> {
        self.code.as_deref().map(|code| match code.trim().parse::<i64>() {
            Ok(number) => CodeOrder::Numeric(number, code),
            Err(_) => CodeOrder::Text(code),
        })
    }
}

/// Numeric codes sort before textual ones; the raw text breaks ties.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum CodeOrder<'a> {
    Numeric(i64, &'a str),
    Text(&'a str),
}

impl Ord for StationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code_order()
            .cmp(&other.code_order())
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.latitude.cmp(&other.latitude))
            .then_with(|| self.longitude.cmp(&other.longitude))
            .then_with(|| self.institution.cmp(&other.institution))
            .then_with(|| self.elevation.cmp(&other.elevation))
    }
}

impl PartialOrd for StationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One value of one variable at one station and hour.
#[derive(Debug, Clone, PartialEq)]
pub struct AgrometRow {
    pub key: StationKey,
    pub observed_at: Option<PrimitiveDateTime>,
    pub variable: Variable,
    pub value: Option<f64>,
}

/// Flattens one variable document into rows, skipping null values.
pub fn flatten_variable(entries: &[AgrometEntry], variable: Variable) -> Vec<AgrometRow> {
    let mut rows = Vec::new();
    for entry in entries {
        let Some(Value::Object(buckets)) = &entry.stack_hour else {
            continue;
        };
        let key = StationKey::of(entry);
        for (timestamp, bucket) in buckets {
            let value = match bucket.get(variable.json_key()) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };
            rows.push(AgrometRow {
                key: key.clone(),
                observed_at: parse_naive_timestamp(timestamp),
                variable,
                value: parse_value(Some(value)),
            });
        }
    }
    rows
}

#[derive(Default)]
struct Latest {
    measurements: Measurements,
    observed_at: Option<PrimitiveDateTime>,
}

impl Latest {
    fn observe(&mut self, row: &AgrometRow) {
        if let Some(value) = row.value {
            let slot = match row.variable {
                Variable::Temperature => &mut self.measurements.temperature,
                Variable::Precipitation => &mut self.measurements.precipitation_24h,
                Variable::WindSpeed => &mut self.measurements.wind_speed_kmh,
                Variable::Humidity => &mut self.measurements.relative_humidity,
                Variable::WindDirection => &mut self.measurements.wind_direction,
            };
            *slot = Some(value);
        }
        if row.observed_at.is_some() {
            self.observed_at = row.observed_at;
        }
    }
}

/// Collapses stacked rows to one reading per station.
///
/// Rows from primary-network institutions and rows whose identity has a
/// missing field are dropped. Within a station the rows are replayed oldest
/// first, so every variable ends up holding its most recent reported value
/// and the reading carries the newest timestamp.
pub fn latest_per_station(mut rows: Vec<AgrometRow>) -> Vec<StationReading> {
    rows.retain(|row| row.key.is_complete() && !row.key.is_primary_network());
    rows.sort_by_key(|row| row.observed_at);

    let mut stations: BTreeMap<StationKey, Latest> = BTreeMap::new();
    for row in &rows {
        stations.entry(row.key.clone()).or_default().observe(row);
    }

    stations
        .into_iter()
        .map(|(key, latest)| StationReading {
            elevation: key.elevation.as_deref().and_then(parse_number),
            latitude: key.latitude.as_deref().and_then(parse_number),
            longitude: key.longitude.as_deref().and_then(parse_number),
            name: key.name,
            institution: key.institution,
            measurements: latest.measurements,
            observed_at: latest.observed_at,
        })
        .collect()
}

/// Reads the asset folder name out of the landing page markup.
pub fn find_asset_path(html: &str) -> Option<&str> {
    ASSET_PATH
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub struct AgrometSource {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl AgrometSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: impl Into<String>) -> Self {
        AgrometSource {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The JSON documents live under a folder that changes per deployment.
    pub async fn discover_asset_path(&self) -> Result<String, Error> {
        let html = self.fetcher.fetch_text(&self.base_url).await?;
        let asset = find_asset_path(&html)
            .ok_or(Error::AssetPathMissing(ASSET_MARKER))?
            .to_string();
        debug!("agromet asset path: {}", asset);
        Ok(asset)
    }

    /// Loads one variable. Failures only cost this variable's contribution.
    pub async fn load_variable(&self, asset: &str, variable: Variable) -> Vec<AgrometRow> {
        let url = format!(
            "{}/json/{}/items-{}.json",
            self.base_url,
            asset,
            variable.file_key()
        );
        let body = match self.fetcher.fetch_text(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("failed to load {}: {}", variable, e);
                return vec![];
            }
        };
        match serde_json::from_str::<Vec<AgrometEntry>>(&body) {
            Ok(entries) => flatten_variable(&entries, variable),
            Err(e) => {
                warn!("failed to decode {}: {}", variable, e);
                vec![]
            }
        }
    }

    /// Current conditions of every non-DMC station in the network.
    pub async fn fetch(&self) -> Result<Vec<StationReading>, Error> {
        let asset = self.discover_asset_path().await?;

        let loads = Variable::ALL
            .iter()
            .map(|variable| self.load_variable(&asset, *variable));
        let rows: Vec<AgrometRow> = join_all(loads).await.into_iter().flatten().collect();

        let readings = latest_per_station(rows);
        if readings.is_empty() {
            warn!("no stations found in agromet data");
        } else {
            info!("loaded agromet data: {} stations", readings.len());
        }
        Ok(readings)
    }
}
