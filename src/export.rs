//! GPX 1.1 rendering of the time-ordered trek.

use crate::features::error::ExportError;
use crate::trek::stats::order_waypoints;
use crate::trek::structs::{TimeOrderedTrek, TrekPhoto};
use chrono::{DateTime, NaiveDate, Utc};
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

pub const CREATOR: &str = "TrekTrack";

/// `trek_route_<YYYY-MM-DD>.gpx`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("trek_route_{}.gpx", date.format("%Y-%m-%d"))
}

fn to_gpx_time(timestamp: DateTime<Utc>) -> Result<gpx::Time, ExportError> {
    let nanos = timestamp
        .timestamp_nanos_opt()
        .ok_or_else(|| ExportError::Timestamp(timestamp.to_rfc3339()))?;
    let datetime = OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|_| ExportError::Timestamp(timestamp.to_rfc3339()))?;
    Ok(datetime.into())
}

/// Renders an already ordered trek, or `None` when it has no waypoints.
pub fn render_trek(trek: &TimeOrderedTrek) -> Result<Option<String>, ExportError> {
    if trek.is_empty() {
        return Ok(None);
    }

    let mut segment = TrackSegment::new();
    for waypoint in trek.waypoints() {
        let location = &waypoint.location;
        let mut point = gpx::Waypoint::new(Point::new(location.lng, location.lat));
        point.elevation = location.alt;
        point.time = location.timestamp.map(to_gpx_time).transpose()?;
        point.name = Some(waypoint.name.clone());
        segment.points.push(point);
    }

    let mut track = Track::new();
    track.name = Some("Trek".to_string());
    track.segments.push(segment);

    let document = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.to_string()),
        tracks: vec![track],
        ..Gpx::default()
    };

    let mut out = Vec::new();
    gpx::write(&document, &mut out)?;
    Ok(Some(String::from_utf8(out)?))
}

/// Orders the geotagged photos and renders them. No waypoints, no document.
pub fn to_track_document(photos: &[TrekPhoto]) -> Result<Option<String>, ExportError> {
    render_trek(&order_waypoints(photos))
}

/// Writes the document into `dir` under the dated file name.
///
/// Returns `Ok(None)` without touching the disk when there is nothing to export.
pub fn write_track_file(
    photos: &[TrekPhoto],
    dir: &Path,
    date: NaiveDate,
) -> Result<Option<PathBuf>, ExportError> {
    let Some(document) = to_track_document(photos)? else {
        return Ok(None);
    };
    let path = dir.join(export_file_name(date));
    std::fs::write(&path, document)?;
    Ok(Some(path))
}
