use itertools::Itertools;
use log::debug;

use crate::{Station, StationReading};

/// Identity used to spot the same station reported by both networks.
/// Coordinates are compared at two decimals (roughly 1 km).
pub type DedupKey = (Option<i64>, Option<i64>, Option<String>);

fn rounded_centi(value: Option<f64>) -> Option<i64> {
    value.map(|v| (v * 100.0).round_ties_even() as i64)
}

pub fn dedup_key(reading: &StationReading) -> DedupKey {
    (
        rounded_centi(reading.latitude),
        rounded_centi(reading.longitude),
        reading.name.clone(),
    )
}

/// Merges both networks into one numbered table.
///
/// Primary rows come first so they win any duplicate. Rows without
/// coordinates or without a single measurement are dropped, and the
/// survivors are numbered from 1 in order.
pub fn reconcile(primary: Vec<StationReading>, secondary: Vec<StationReading>) -> Vec<Station> {
    let total = primary.len() + secondary.len();

    let stations: Vec<Station> = primary
        .into_iter()
        .chain(secondary)
        .unique_by(dedup_key)
        .filter_map(|reading| {
            let (latitude, longitude) = (reading.latitude?, reading.longitude?);
            Some((reading, latitude, longitude))
        })
        .filter(|(reading, _, _)| reading.measurements.has_any())
        .zip(1u32..)
        .map(|((reading, latitude, longitude), id)| {
            let m = reading.measurements;
            Station {
                id,
                name: reading.name,
                elevation: reading.elevation,
                latitude,
                longitude,
                institution: reading.institution,
                precipitation_24h: m.precipitation_24h.into(),
                temperature: m.temperature.into(),
                relative_humidity: m.relative_humidity.into(),
                wind_speed_kmh: m.wind_speed_kmh.into(),
                wind_direction: m.wind_direction.into(),
                observed_at: reading.observed_at,
            }
        })
        .collect();

    debug!("reconciled {} readings into {} stations", total, stations.len());
    stations
}
