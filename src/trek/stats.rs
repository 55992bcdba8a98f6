use crate::trek::structs::{
    Bounds, ProfilePoint, TimeOrderedTrek, TrekPhoto, TrekStatistics, TrekView, Waypoint,
};
use chrono::{DateTime, Utc};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

fn segment_km(from: &Waypoint, to: &Waypoint) -> f64 {
    haversine_km(
        from.location.lat,
        from.location.lng,
        to.location.lat,
        to.location.lng,
    )
}

/// Geotagged photos, stable-sorted by capture time. Undated photos count as the epoch.
pub fn order_waypoints(photos: &[TrekPhoto]) -> TimeOrderedTrek {
    let mut located: Vec<_> = photos
        .iter()
        .filter_map(|photo| photo.location.as_ref().map(|location| (photo, location)))
        .collect();
    located.sort_by_key(|(_, location)| location.timestamp.unwrap_or(DateTime::<Utc>::UNIX_EPOCH));

    let waypoints = located
        .into_iter()
        .enumerate()
        .map(|(index, (photo, location))| Waypoint {
            number: index + 1,
            id: photo.id.clone(),
            name: photo.name.clone(),
            location: location.clone(),
            display_handle: photo.display_handle.key().clone(),
        })
        .collect();
    TimeOrderedTrek::new(waypoints)
}

/// Aggregates over the ordered trek, or `None` below two waypoints.
pub fn compute_statistics(trek: &TimeOrderedTrek) -> Option<TrekStatistics> {
    let waypoints = trek.waypoints();
    if waypoints.len() < 2 {
        return None;
    }

    let total_distance_km: f64 = waypoints
        .windows(2)
        .map(|pair| segment_km(&pair[0], &pair[1]))
        .sum();

    let peak_elevation_m = waypoints
        .iter()
        .filter_map(|w| w.location.alt)
        .reduce(f64::max);

    let first = waypoints.first().and_then(|w| w.location.timestamp);
    let last = waypoints.last().and_then(|w| w.location.timestamp);
    let duration_minutes = match (first, last) {
        (Some(start), Some(end)) => {
            Some(((end - start).num_milliseconds() as f64 / 60_000.0).round() as i64)
        }
        _ => None,
    };

    Some(TrekStatistics {
        total_distance_km,
        peak_elevation_m,
        duration_minutes,
    })
}

/// Cumulative distance against altitude, for waypoints that carry an altitude.
pub fn elevation_profile(trek: &TimeOrderedTrek) -> Vec<ProfilePoint> {
    let mut walked = 0.0;
    let mut previous: Option<&Waypoint> = None;
    let mut profile = Vec::new();

    for waypoint in trek.waypoints() {
        if let Some(prev) = previous {
            walked += segment_km(prev, waypoint);
        }
        previous = Some(waypoint);

        if let Some(elevation_m) = waypoint.location.alt {
            profile.push(ProfilePoint {
                waypoint_number: waypoint.number,
                id: waypoint.id.clone(),
                distance_km: walked,
                elevation_m,
            });
        }
    }
    profile
}

pub fn bounds(trek: &TimeOrderedTrek) -> Option<Bounds> {
    trek.waypoints().iter().fold(None, |acc, w| {
        let (lat, lng) = (w.location.lat, w.location.lng);
        Some(match acc {
            None => Bounds {
                south: lat,
                west: lng,
                north: lat,
                east: lng,
            },
            Some(b) => Bounds {
                south: b.south.min(lat),
                west: b.west.min(lng),
                north: b.north.max(lat),
                east: b.east.max(lng),
            },
        })
    })
}

/// Recomputes every derived value from the collection. Pure and idempotent.
pub fn recompute(photos: &[TrekPhoto]) -> TrekView {
    let trek = order_waypoints(photos);
    TrekView {
        statistics: compute_statistics(&trek),
        profile: elevation_profile(&trek),
        bounds: bounds(&trek),
        trek,
    }
}
