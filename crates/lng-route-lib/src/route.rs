//! Route storage module
//!
//! This module provides the `Route` struct holding a routed geometry together
//! with its Web Mercator projection and precomputed display metrics.

use crate::projection::{self, Crs};
use crate::router::{Passage, RouteResponse, RoutingError};
use geo::Point;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Round half-up to the given number of decimals
///
/// The scaled value is nudged by one relative epsilon so that decimal ties
/// stored just below the half (1.005 is 1.00499999...) still round up.
#[inline]
pub(crate) fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    (scaled + scaled.abs() * f64::EPSILON).round() / factor
}

/// A routed path between two terminals, ready for display
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Route {
    /// Name of the start terminal
    start: String,
    /// Name of the end terminal
    end: String,
    /// Waypoints as (lon, lat)
    geometry: Vec<Point<f64>>,
    /// Waypoints in Web Mercator meters, parallel to `geometry`
    projected_geometry: Vec<Point<f64>>,
    /// Raw transit time from the router
    duration_hours: f64,
    /// Raw route length from the router
    length_km: f64,
    /// Transit time in days, rounded to 2 decimals
    duration_days: f64,
    /// Route length rounded to whole kilometers
    length_km_rounded: f64,
    /// Vessel speed the route was computed for
    speed_knots: f64,
    /// Passages the route was asked to avoid
    restrictions: BTreeSet<Passage>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Route {
    /// Build a route from a router response
    ///
    /// Validates the response, derives display metrics and projects every
    /// waypoint. The projected geometry has exactly one point per waypoint.
    pub fn from_response(
        start: &str,
        end: &str,
        speed_knots: f64,
        restrictions: BTreeSet<Passage>,
        response: RouteResponse,
    ) -> Result<Arc<Self>, RoutingError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("route::from_response");

        let response = response.validate()?;
        let projected_geometry =
            projection::project_all(&response.geometry, Crs::Wgs84, Crs::WebMercator);

        let skipped = projected_geometry
            .iter()
            .filter(|p| !projection::is_valid_mercator(p))
            .count();
        if skipped > 0 {
            tracing::warn!("{skipped} waypoint(s) fall outside Web Mercator bounds");
        }

        Ok(Arc::new(Self {
            start: start.to_string(),
            end: end.to_string(),
            duration_days: round_half_up(response.duration_hours / 24.0, 2),
            length_km_rounded: round_half_up(response.length_km, 0),
            duration_hours: response.duration_hours,
            length_km: response.length_km,
            geometry: response.geometry,
            projected_geometry,
            speed_knots,
            restrictions,
        }))
    }

    #[inline]
    pub fn start(&self) -> &str {
        &self.start
    }

    #[inline]
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Waypoints as (lon, lat)
    #[inline]
    pub fn geometry(&self) -> &[Point<f64>] {
        &self.geometry
    }

    /// Waypoints in Web Mercator meters, index-aligned with [`Route::geometry`]
    #[inline]
    pub fn projected_geometry(&self) -> &[Point<f64>] {
        &self.projected_geometry
    }

    #[inline]
    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    #[inline]
    pub fn length_km(&self) -> f64 {
        self.length_km
    }

    #[inline]
    pub fn duration_days(&self) -> f64 {
        self.duration_days
    }

    #[inline]
    pub fn length_km_rounded(&self) -> f64 {
        self.length_km_rounded
    }

    #[inline]
    pub fn speed_knots(&self) -> f64 {
        self.speed_knots
    }

    #[inline]
    pub fn restrictions(&self) -> &BTreeSet<Passage> {
        &self.restrictions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> RouteResponse {
        RouteResponse {
            geometry: vec![
                Point::new(-93.87, 29.74),
                Point::new(-80.0, 25.0),
                Point::new(-40.0, 40.0),
                Point::new(3.2, 51.33),
            ],
            duration_hours: 301.0,
            length_km: 8912.5,
        }
    }

    #[test]
    fn test_route_metrics() {
        let route = Route::from_response(
            "Sabine Pass",
            "Zeebrugge",
            15.0,
            BTreeSet::from([Passage::Northwest]),
            response(),
        )
        .unwrap();

        // 301 / 24 = 12.541666...
        assert_eq!(route.duration_days(), 12.54);
        assert_eq!(route.length_km_rounded(), 8913.0);
        assert_eq!(route.duration_hours(), 301.0);
        assert_eq!(route.length_km(), 8912.5);
        assert_eq!(route.start(), "Sabine Pass");
        assert_eq!(route.end(), "Zeebrugge");
    }

    #[test]
    fn test_projection_is_index_aligned() {
        let route =
            Route::from_response("A", "B", 15.0, BTreeSet::new(), response()).unwrap();
        assert_eq!(route.geometry().len(), route.projected_geometry().len());
        for (geo, projected) in route.geometry().iter().zip(route.projected_geometry()) {
            assert_eq!(
                *projected,
                projection::project(*geo, Crs::Wgs84, Crs::WebMercator)
            );
        }
    }

    #[test]
    fn test_degenerate_response_is_rejected() {
        let mut degenerate = response();
        degenerate.geometry.truncate(1);
        let result = Route::from_response("A", "B", 15.0, BTreeSet::new(), degenerate);
        assert!(matches!(result, Err(RoutingError::Degenerate { points: 1 })));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(12.345, 2), 12.35);
        assert_eq!(round_half_up(12.5, 0), 13.0);
        assert_eq!(round_half_up(0.125, 2), 0.13);
        assert_eq!(round_half_up(2.0 / 3.0, 2), 0.67);
    }

    #[test]
    fn test_round_half_up_decimal_ties() {
        // Binary values just below the tie still round up
        assert_eq!(round_half_up(1.005, 2), 1.01);
        assert_eq!(round_half_up(1.015, 2), 1.02);
        assert_eq!(round_half_up(0.285, 2), 0.29);
        assert_eq!(round_half_up(36.12 / 24.0, 2), 1.51);
        assert_eq!(round_half_up(1.0049, 2), 1.0);
    }
}
