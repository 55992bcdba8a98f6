//! Utility functions for turning EXIF date strings into chrono types.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Rewrites the EXIF date convention (`YYYY:MM:DD HH:MM:SS`) into the standard
/// `YYYY-MM-DD HH:MM:SS` form by replacing the first two colons with hyphens.
/// Everything after the second colon is left untouched.
pub fn normalize_exif_datetime(s: &str) -> String {
    s.trim().replacen(':', "-", 2)
}

/// Parses an EXIF capture timestamp. The value carries no zone, so it is taken as UTC.
///
/// Returns `None` for anything malformed, including out-of-range fields and
/// the all-zero placeholder some cameras write.
pub fn parse_exif_datetime(s: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize_exif_datetime(s);
    // A trailing `Z` names UTC outright, so it parses the same as the bare form.
    let formats = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.fZ",
        "%Y-%m-%d %H:%M:%SZ",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            // Some writers append an explicit offset, e.g. "2024-06-01 08:15:00+02:00".
            DateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%:z")
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}
