use crate::features::display_handle::{DisplayHandle, HandleKey};
use crate::features::gps::GpsLocation;
use crate::features::metadata::CameraMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, session-unique photo identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PhotoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ingested photo. Owns its display handle.
#[derive(Debug)]
pub struct TrekPhoto {
    pub id: PhotoId,
    pub name: String,
    pub display_handle: DisplayHandle,
    /// Base64 of the displayable bytes, without the `data:` envelope.
    pub inline_encoding: String,
    pub location: Option<GpsLocation>,
    pub camera: Option<CameraMetadata>,
    pub mime_type: String,
}

impl TrekPhoto {
    pub fn is_waypoint(&self) -> bool {
        self.location.is_some()
    }
}

/// Flat-list entry for every photo, geotagged or not.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSummary {
    pub id: PhotoId,
    pub name: String,
    pub mime_type: String,
    pub display_handle: HandleKey,
    pub location: Option<GpsLocation>,
    pub camera: Option<CameraMetadata>,
}

impl From<&TrekPhoto> for PhotoSummary {
    fn from(photo: &TrekPhoto) -> Self {
        Self {
            id: photo.id.clone(),
            name: photo.name.clone(),
            mime_type: photo.mime_type.clone(),
            display_handle: photo.display_handle.key().clone(),
            location: photo.location.clone(),
            camera: photo.camera.clone(),
        }
    }
}

/// A geotagged photo positioned in the trek.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// 1-based position in the time-ordered trek.
    pub number: usize,
    pub id: PhotoId,
    pub name: String,
    pub location: GpsLocation,
    pub display_handle: HandleKey,
}

/// Geotagged photos in ascending capture order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TimeOrderedTrek {
    waypoints: Vec<Waypoint>,
}

impl TimeOrderedTrek {
    pub(crate) fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Zero-based index of a photo in the trek.
    pub fn index_of(&self, id: &PhotoId) -> Option<usize> {
        self.waypoints.iter().position(|w| &w.id == id)
    }

    pub fn ids(&self) -> Vec<PhotoId> {
        self.waypoints.iter().map(|w| w.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrekStatistics {
    pub total_distance_km: f64,
    pub peak_elevation_m: Option<f64>,
    pub duration_minutes: Option<i64>,
}

/// One sample of the elevation chart.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePoint {
    pub waypoint_number: usize,
    pub id: PhotoId,
    /// Distance walked from the first waypoint up to this one.
    pub distance_km: f64,
    pub elevation_m: f64,
}

/// South-west / north-east corners enclosing a set of waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lng)
    }
}

/// Everything derived from the collection in one recompute.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrekView {
    pub trek: TimeOrderedTrek,
    /// `None` when fewer than two waypoints exist.
    pub statistics: Option<TrekStatistics>,
    pub profile: Vec<ProfilePoint>,
    pub bounds: Option<Bounds>,
}
