use crate::time::parse_exif_datetime;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?\d+(?:\.\d+)?)").expect("leading number pattern is valid")
});

/// Tags consulted for the capture time, in priority order.
const TIMESTAMP_TAGS: [&str; 2] = ["DateTimeOriginal", "CreateDate"];

/// A GPS fix attached to a photo.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsLocation {
    pub lat: f64,
    pub lng: f64,
    /// Meters above sea level.
    pub alt: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Reads a value as a finite number. Numeric strings such as `"152.3 m"` are accepted.
fn finite_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    };
    number.filter(|n: &f64| n.is_finite())
}

fn altitude_from_tags(numeric_exif: &Value) -> Option<f64> {
    let altitude = numeric_exif.get("GPSAltitude").and_then(finite_number)?;
    let below_sea_level = numeric_exif
        .get("GPSAltitudeRef")
        .and_then(finite_number)
        .is_some_and(|r| r == 1.0);
    Some(if below_sea_level && altitude > 0.0 {
        -altitude
    } else {
        altitude
    })
}

fn timestamp_from_tags(numeric_exif: &Value) -> Option<DateTime<Utc>> {
    TIMESTAMP_TAGS.iter().find_map(|tag| {
        numeric_exif
            .get(*tag)
            .and_then(Value::as_str)
            .and_then(parse_exif_datetime)
    })
}

/// Builds a location from a numeric tag dictionary.
///
/// Latitude and longitude must both be present and in range; anything else
/// is treated as "no fix".
pub fn location_from_tags(numeric_exif: &Value) -> Option<GpsLocation> {
    let (Some(lat), Some(lng)) = (
        numeric_exif.get("GPSLatitude").and_then(finite_number),
        numeric_exif.get("GPSLongitude").and_then(finite_number),
    ) else {
        return None;
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }

    Some(GpsLocation {
        lat,
        lng,
        alt: altitude_from_tags(numeric_exif),
        timestamp: timestamp_from_tags(numeric_exif),
    })
}
