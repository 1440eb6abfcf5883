//! Coordinate conversions between WGS84 and Web Mercator (EPSG:3857)
//!
//! All points follow the `geo` convention: `x` is longitude / easting and `y` is
//! latitude / northing.

use geo::Point;
use rayon::prelude::*;

/// Web Mercator bounds in meters (EPSG:3857), i.e. PI times the WGS84 semi-major axis
pub const EARTH_MERCATOR_MAX: f64 = 20037508.342789244;
pub const EARTH_MERCATOR_MIN: f64 = -EARTH_MERCATOR_MAX;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Geometries below this size are projected sequentially
const PARALLEL_THRESHOLD: usize = 4096;

/// Coordinate reference systems understood by [`project`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Geographic WGS84 degrees (EPSG:4326)
    Wgs84,
    /// Spherical Web Mercator meters (EPSG:3857)
    WebMercator,
}

/// Transform a point between coordinate reference systems
#[inline]
pub fn project(point: Point<f64>, from: Crs, to: Crs) -> Point<f64> {
    match (from, to) {
        (Crs::Wgs84, Crs::WebMercator) => wgs84_to_mercator(point.y(), point.x()),
        (Crs::WebMercator, Crs::Wgs84) => {
            let (lat, lon) = mercator_to_wgs84(point.x(), point.y());
            Point::new(lon, lat)
        }
        _ => point,
    }
}

/// Project a sequence of points, preserving order and count
pub fn project_all(points: &[Point<f64>], from: Crs, to: Crs) -> Vec<Point<f64>> {
    if points.len() < PARALLEL_THRESHOLD {
        points.iter().map(|&p| project(p, from, to)).collect()
    } else {
        points.par_iter().map(|&p| project(p, from, to)).collect()
    }
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// # Arguments
/// * `lat` - Latitude in degrees (-85.05 to 85.05)
/// * `lon` - Longitude in degrees (-180 to 180)
///
/// # Returns
/// A `Point<f64>` with x (easting) and y (northing) in meters
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    // Clamp latitude to valid Web Mercator range
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84 (lat, lon)
///
/// # Returns
/// A tuple of (latitude, longitude) in degrees
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

/// Check if a point is within Web Mercator bounds
#[inline(always)]
pub fn is_valid_mercator(point: &Point<f64>) -> bool {
    let x = point.x();
    let y = point.y();
    (EARTH_MERCATOR_MIN..=EARTH_MERCATOR_MAX).contains(&x)
        && (EARTH_MERCATOR_MIN..=EARTH_MERCATOR_MAX).contains(&y)
}
