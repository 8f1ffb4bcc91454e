//! Value normalization shared by the station adapters.
//!
//! Upstream feeds deliver numbers as text with decimal commas and unit
//! suffixes, wind in knots, timestamps in mixed layouts and names that were
//! decoded with the wrong charset. Everything here maps bad input to `None`
//! except [`repair_encoding`], whose failure means the feed itself is broken.

use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;
use time::{
    format_description::{well_known::Rfc3339, BorrowedFormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, Time,
};
use time_tz::{timezones, OffsetDateTimeExt};

use crate::Error;

pub const KNOTS_TO_KMH: f64 = 1.852;

/// Layout used for naive local timestamps in the station feed.
pub const LOCAL_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Layout used for UTC timestamps (`last_update`, hotspot `time`).
pub const UTC_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

const NAIVE_LAYOUTS: [&[BorrowedFormatItem<'static>]; 6] = [
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
];

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d*\.?\d+").expect("valid number pattern"));

/// Extracts the first signed decimal number from `raw`, accepting a decimal
/// comma. `"23,5"` gives 23.5, `"  -3.2 C"` gives -3.2, `"n/d"` gives `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', ".");
    NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Textual form of a JSON scalar. Null and containers have none.
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// [`parse_number`] applied to an optional JSON scalar.
pub fn parse_value(value: Option<&Value>) -> Option<f64> {
    value.and_then(value_text).and_then(|s| parse_number(&s))
}

/// Rounds half to even at `decimals` places, the way the dataframe library
/// the feeds were first published with does.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

pub fn knots_to_kmh(knots: f64) -> f64 {
    round_half_even(knots * KNOTS_TO_KMH, 1)
}

/// Parses a wind speed such as `"10 kt"` and returns it in km/h.
pub fn parse_wind_knots(raw: &str) -> Option<f64> {
    parse_number(raw.replace("kt", "").trim()).map(knots_to_kmh)
}

/// Undoes UTF-8 text that was decoded as Latin-1 upstream
/// (`"ConcepciÃ³n"` becomes `"Concepción"`).
pub fn repair_encoding(name: &str) -> Result<String, Error> {
    let bytes = name
        .chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| Error::Encoding {
                name: name.to_string(),
                reason: format!("character {:?} is outside latin-1", c),
            })
        })
        .collect::<Result<Vec<u8>, Error>>()?;

    String::from_utf8(bytes).map_err(|e| Error::Encoding {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a naive timestamp in any of the layouts the feeds use.
pub fn parse_naive_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| PrimitiveDateTime::parse(raw, *layout).ok())
        .or_else(|| {
            Date::parse(raw, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
        })
}

/// Parses a timestamp carrying an offset, or a naive one taken as UTC.
pub fn parse_utc_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .ok()
        .or_else(|| parse_naive_timestamp(raw).map(PrimitiveDateTime::assume_utc))
}

/// Converts a UTC timestamp to Chilean wall-clock time, dropping the offset.
pub fn to_santiago_local(instant: OffsetDateTime) -> PrimitiveDateTime {
    let local = instant.to_timezone(timezones::db::america::SANTIAGO);
    PrimitiveDateTime::new(local.date(), local.time())
}

/// Full timestamp normalization for the primary network's `momento`.
pub fn normalize_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    parse_utc_timestamp(raw).map(to_santiago_local)
}
