//! Offline great-circle routing backend
//!
//! Follows the shortest path on a spherical Earth. It knows nothing about
//! coastlines or passages, so restrictions are accepted but cannot change the
//! result. Useful when no sea-routing backend is installed, and in tests.

use super::{MaritimeRouter, RouteRequest, RouteResponse, RoutingError};
use geo::Point;

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// One knot in km/h
const KNOT_KM_H: f64 = 1.852;

/// Smallest accepted waypoint spacing; keeps a half-circumference route under 200k points
pub const MIN_STEP_KM: f64 = 0.1;

/// Configuration for the great-circle backend
#[derive(Debug, Clone, PartialEq)]
pub struct GreatCircleConfig {
    /// Maximum distance between consecutive waypoints in kilometers (default 100,
    /// at least [`MIN_STEP_KM`])
    pub max_step_km: f64,
}

impl Default for GreatCircleConfig {
    fn default() -> Self {
        Self { max_step_km: 100.0 }
    }
}

/// Routing backend that interpolates the great circle between two positions
#[derive(Debug, Clone, Default)]
pub struct GreatCircleRouter {
    config: GreatCircleConfig,
}

impl GreatCircleRouter {
    pub fn new(config: GreatCircleConfig) -> Self {
        Self { config }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl MaritimeRouter for GreatCircleRouter {
    fn name(&self) -> &str {
        "great-circle"
    }

    fn route(&self, request: &RouteRequest) -> Result<RouteResponse, RoutingError> {
        if !request.restrictions.is_empty() {
            tracing::debug!(
                "Great-circle routing ignores passage restrictions: {:?}",
                request.restrictions
            );
        }

        let step_km = self.config.max_step_km;
        if !step_km.is_finite() || step_km < MIN_STEP_KM {
            return Err(RoutingError::Backend {
                reason: format!(
                    "waypoint spacing must be a finite number of at least {MIN_STEP_KM} km, got {step_km}"
                ),
            });
        }

        let length_km = haversine_km(request.origin, request.destination);
        let angle = length_km / EARTH_RADIUS_KM;
        if angle < 1e-12 {
            return Err(RoutingError::NoRoute {
                reason: "origin and destination coincide".to_string(),
            });
        }
        if angle.sin() < 1e-12 {
            return Err(RoutingError::NoRoute {
                reason: "origin and destination are antipodal".to_string(),
            });
        }

        let steps = (length_km / step_km).ceil().max(1.0) as usize;

        let mut geometry: Vec<Point<f64>> = (0..=steps)
            .map(|i| {
                let fraction = i as f64 / steps as f64;
                intermediate_point(request.origin, request.destination, angle, fraction)
            })
            .collect();
        // Endpoints exactly as requested
        geometry[0] = request.origin;
        geometry[steps] = request.destination;

        Ok(RouteResponse {
            geometry,
            duration_hours: length_km / (request.speed_knots * KNOT_KM_H),
            length_km,
        })
    }
}

/// Angular distance in radians between two (lon, lat) points (Haversine formula)
#[inline]
fn central_angle(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Haversine distance in kilometers between two (lon, lat) points
#[inline]
fn haversine_km(p1: Point<f64>, p2: Point<f64>) -> f64 {
    central_angle(p1, p2) * EARTH_RADIUS_KM
}

/// Point at `fraction` of the way along the great circle from `p1` to `p2`
#[inline]
fn intermediate_point(p1: Point<f64>, p2: Point<f64>, angle: f64, fraction: f64) -> Point<f64> {
    let (lat1, lon1) = (p1.y().to_radians(), p1.x().to_radians());
    let (lat2, lon2) = (p2.y().to_radians(), p2.x().to_radians());

    let a = ((1.0 - fraction) * angle).sin() / angle.sin();
    let b = (fraction * angle).sin() / angle.sin();

    let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
    let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
    let z = a * lat1.sin() + b * lat2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);
    Point::new(lon.to_degrees(), lat.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Passage;
    use std::collections::BTreeSet;

    fn request(origin: (f64, f64), destination: (f64, f64)) -> RouteRequest {
        RouteRequest {
            origin: Point::new(origin.0, origin.1),
            destination: Point::new(destination.0, destination.1),
            speed_knots: 15.0,
            restrictions: BTreeSet::from([Passage::Northwest]),
        }
    }

    #[test]
    fn test_equator_quarter_circle() {
        let router = GreatCircleRouter::default();
        let response = router.route(&request((0.0, 0.0), (90.0, 0.0))).unwrap();

        let expected_km = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_KM;
        assert!((response.length_km - expected_km).abs() < 1e-6);
        assert!((response.duration_hours - expected_km / (15.0 * KNOT_KM_H)).abs() < 1e-9);

        // Every waypoint stays on the equator
        for point in &response.geometry {
            assert!(point.y().abs() < 1e-9);
        }
        assert_eq!(response.geometry.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(response.geometry.last(), Some(&Point::new(90.0, 0.0)));
    }

    #[test]
    fn test_step_size_bounds_spacing() {
        let router = GreatCircleRouter::new(GreatCircleConfig { max_step_km: 50.0 });
        let response = router.route(&request((-93.87, 29.74), (3.2, 51.33))).unwrap();

        assert!(response.geometry.len() >= 2);
        for pair in response.geometry.windows(2) {
            assert!(haversine_km(pair[0], pair[1]) <= 50.0 + 1e-6);
        }
    }

    #[test]
    fn test_short_hop_has_two_points() {
        let router = GreatCircleRouter::default();
        let response = router.route(&request((3.2, 51.33), (4.03, 51.95))).unwrap();
        assert_eq!(response.geometry.len(), 2);
    }

    #[test]
    fn test_same_position_is_no_route() {
        let router = GreatCircleRouter::default();
        let result = router.route(&request((3.2, 51.33), (3.2, 51.33)));
        assert!(matches!(result, Err(RoutingError::NoRoute { .. })));
    }

    #[test]
    fn test_antipodal_is_no_route() {
        let router = GreatCircleRouter::default();
        let result = router.route(&request((0.0, 0.0), (180.0, 0.0)));
        assert!(matches!(result, Err(RoutingError::NoRoute { .. })));
    }

    #[test]
    fn test_tiny_or_invalid_step_is_rejected() {
        for max_step_km in [1e-300, 1e-6, 0.0, -5.0, f64::NAN, f64::INFINITY] {
            let router = GreatCircleRouter::new(GreatCircleConfig { max_step_km });
            let result = router.route(&request((-93.87, 29.74), (3.2, 51.33)));
            assert!(
                matches!(result, Err(RoutingError::Backend { .. })),
                "step {max_step_km} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_minimum_step_is_accepted() {
        let router = GreatCircleRouter::new(GreatCircleConfig {
            max_step_km: MIN_STEP_KM,
        });
        let response = router.route(&request((3.2, 51.33), (4.03, 51.95))).unwrap();
        // About 88 km at 0.1 km spacing
        assert!(response.geometry.len() > 800);
        assert!(response.geometry.len() < 1000);
    }

    #[test]
    fn test_haversine_known_distance() {
        // London to Paris is about 344 km
        let d = haversine_km(Point::new(-0.1278, 51.5074), Point::new(2.3522, 48.8566));
        assert!((d - 343.5).abs() < 2.0, "got {d}");
    }
}
