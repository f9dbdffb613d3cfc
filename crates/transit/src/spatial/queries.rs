//! Distance helpers for stop lookups.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use geo::{HaversineDistance, Point};

/// Meters per degree at the equator, rounded down so that degree radii
/// derived from it never undershoot the Haversine distance
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Widen a radius in meters into a degree radius safe for R-tree pruning.
///
/// A degree of longitude shrinks towards the poles, so the degree radius is
/// scaled by the latitude. The result over-approximates; callers must still
/// filter candidates with [`haversine_distance`].
pub fn search_radius_degrees(radius_m: f64, latitude: f64) -> f64 {
    let lat_scale = latitude.to_radians().cos().abs().max(0.01);
    radius_m / METERS_PER_DEGREE / lat_scale
}
