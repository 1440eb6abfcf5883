//! Maritime routing capability
//!
//! The routing algorithm itself lives outside this crate. [`MaritimeRouter`] is the
//! narrow interface the projector talks to; the submodules provide backends:
//!
//! - [`GreatCircleRouter`]: offline great-circle approximation
//! - [`CommandRouter`]: delegates to an external program over JSON/GeoJSON
//! - [`TimeoutRouter`]: bounds any in-process router with a deadline

mod command;
mod great_circle;
mod timeout;

pub use command::{CommandRouter, CommandRouterConfig};
pub use great_circle::{GreatCircleConfig, GreatCircleRouter, MIN_STEP_KM};
pub use timeout::TimeoutRouter;

use geo::Point;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Named maritime chokepoint a route may be forbidden to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Passage {
    Suez,
    Panama,
    Gibraltar,
    Bosporus,
    Babalmandab,
    Ormuz,
    Northwest,
    Malacca,
    Sunda,
    Chili,
    SouthAfrica,
}

impl Passage {
    /// Identifier understood by routing backends
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suez => "suez",
            Self::Panama => "panama",
            Self::Gibraltar => "gibraltar",
            Self::Bosporus => "bosporus",
            Self::Babalmandab => "babalmandab",
            Self::Ormuz => "ormuz",
            Self::Northwest => "northwest",
            Self::Malacca => "malacca",
            Self::Sunda => "sunda",
            Self::Chili => "chili",
            Self::SouthAfrica => "south_africa",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Suez,
            Self::Panama,
            Self::Gibraltar,
            Self::Bosporus,
            Self::Babalmandab,
            Self::Ormuz,
            Self::Northwest,
            Self::Malacca,
            Self::Sunda,
            Self::Chili,
            Self::SouthAfrica,
        ]
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown passage {0:?}")]
pub struct ParsePassageError(String);

impl FromStr for Passage {
    type Err = ParsePassageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::all()
            .iter()
            .copied()
            .find(|passage| passage.as_str() == wanted)
            .ok_or_else(|| ParsePassageError(s.to_string()))
    }
}

/// Errors raised by routing backends
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("No feasible route: {reason}")]
    NoRoute { reason: String },

    #[error("Routing timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Degenerate route geometry with {points} waypoint(s)")]
    Degenerate { points: usize },

    #[error("Invalid router response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Routing backend failed: {reason}")]
    Backend { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single routing query
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// Start position as (lon, lat)
    pub origin: Point<f64>,
    /// End position as (lon, lat)
    pub destination: Point<f64>,
    /// Vessel speed in knots
    pub speed_knots: f64,
    /// Passages the route must avoid
    pub restrictions: BTreeSet<Passage>,
}

/// Raw routing result
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    /// Waypoints as (lon, lat)
    pub geometry: Vec<Point<f64>>,
    /// Estimated transit time in hours
    pub duration_hours: f64,
    /// Route length in kilometers
    pub length_km: f64,
}

impl RouteResponse {
    /// Reject responses that cannot be drawn or measured
    pub fn validate(self) -> Result<Self, RoutingError> {
        if self.geometry.len() < 2 {
            return Err(RoutingError::Degenerate {
                points: self.geometry.len(),
            });
        }
        if let Some(index) = self
            .geometry
            .iter()
            .position(|p| !p.x().is_finite() || !p.y().is_finite())
        {
            return Err(RoutingError::InvalidResponse {
                reason: format!("waypoint {index} is not a finite coordinate"),
            });
        }
        if !self.duration_hours.is_finite() || self.duration_hours < 0.0 {
            return Err(RoutingError::InvalidResponse {
                reason: format!("duration {} h is not a valid value", self.duration_hours),
            });
        }
        if !self.length_km.is_finite() || self.length_km < 0.0 {
            return Err(RoutingError::InvalidResponse {
                reason: format!("length {} km is not a valid value", self.length_km),
            });
        }
        Ok(self)
    }
}

/// Routing capability: produces a sea route between two positions
pub trait MaritimeRouter: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Compute a route, or explain why none could be produced
    fn route(&self, request: &RouteRequest) -> Result<RouteResponse, RoutingError>;
}

impl<R: MaritimeRouter + ?Sized> MaritimeRouter for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn route(&self, request: &RouteRequest) -> Result<RouteResponse, RoutingError> {
        (**self).route(request)
    }
}

impl<R: MaritimeRouter + ?Sized> MaritimeRouter for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn route(&self, request: &RouteRequest) -> Result<RouteResponse, RoutingError> {
        (**self).route(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(points: usize) -> RouteResponse {
        RouteResponse {
            geometry: (0..points)
                .map(|i| Point::new(i as f64, i as f64))
                .collect(),
            duration_hours: 10.0,
            length_km: 300.0,
        }
    }

    #[test]
    fn test_passage_roundtrip_names() {
        for passage in Passage::all() {
            assert_eq!(passage.as_str().parse::<Passage>().unwrap(), *passage);
        }
    }

    #[test]
    fn test_passage_parse_is_lenient() {
        assert_eq!("Suez".parse::<Passage>().unwrap(), Passage::Suez);
        assert_eq!(
            "south-africa".parse::<Passage>().unwrap(),
            Passage::SouthAfrica
        );
        assert!("kiel".parse::<Passage>().is_err());
    }

    #[test]
    fn test_passage_serializes_as_backend_name() {
        let json = serde_json::to_string(&Passage::SouthAfrica).unwrap();
        assert_eq!(json, "\"south_africa\"");
    }

    #[test]
    fn test_validate_accepts_two_points() {
        assert!(response(2).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_degenerate_geometry() {
        assert!(matches!(
            response(1).validate(),
            Err(RoutingError::Degenerate { points: 1 })
        ));
        assert!(matches!(
            response(0).validate(),
            Err(RoutingError::Degenerate { points: 0 })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        let mut bad = response(3);
        bad.geometry[1] = Point::new(f64::NAN, 0.0);
        assert!(matches!(
            bad.validate(),
            Err(RoutingError::InvalidResponse { .. })
        ));

        let mut bad = response(3);
        bad.duration_hours = -1.0;
        assert!(matches!(
            bad.validate(),
            Err(RoutingError::InvalidResponse { .. })
        ));

        let mut bad = response(3);
        bad.length_km = f64::INFINITY;
        assert!(matches!(
            bad.validate(),
            Err(RoutingError::InvalidResponse { .. })
        ));
    }
}
