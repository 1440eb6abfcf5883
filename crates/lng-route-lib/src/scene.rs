//! Renderer-agnostic map model
//!
//! A [`MapScene`] holds everything a map frontend needs to draw terminals and a
//! route: projected coordinates, colours and tooltip fields. It serializes to
//! JSON so any renderer can consume it.

use crate::projection::EARTH_MERCATOR_MAX;
use crate::{Route, Status, Terminal};
use serde::Serialize;

/// Half-width of the square Web Mercator world in meters
pub const WORLD_EXTENT: f64 = EARTH_MERCATOR_MAX;

const OPERATING_COLOR: &str = "blue";
const OTHER_COLOR: &str = "green";
const ROUTE_COLOR: &str = "red";
const ROUTE_WIDTH: f32 = 2.0;

/// Map contents ready for a renderer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapScene {
    /// `[min_x, min_y, max_x, max_y]` in Web Mercator meters
    pub extent: [f64; 4],
    /// One layer per terminal status, in first-seen order
    pub layers: Vec<MarkerLayer>,
    pub route: Option<RouteLine>,
}

/// Terminals sharing a status
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub status: Status,
    pub color: &'static str,
    pub markers: Vec<Marker>,
}

/// A terminal marker with its hover fields
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub status: Status,
    pub parent: String,
    pub capacity_mtpa: f64,
}

/// The routed path with its hover fields
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteLine {
    /// Projected `[x, y]` points
    pub points: Vec<[f64; 2]>,
    pub color: &'static str,
    pub width: f32,
    pub start: String,
    pub end: String,
    pub duration_days: f64,
    pub length_km: f64,
}

impl MapScene {
    /// Lay out `terminals` and an optional `route`
    pub fn build<'a>(
        terminals: impl IntoIterator<Item = &'a Terminal>,
        route: Option<&Route>,
    ) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("scene::build");

        let mut layers: Vec<MarkerLayer> = Vec::new();
        for terminal in terminals {
            let marker = Marker::from(terminal);
            match layers.iter_mut().find(|layer| layer.status == marker.status) {
                Some(layer) => layer.markers.push(marker),
                None => layers.push(MarkerLayer {
                    color: status_color(&marker.status),
                    status: marker.status.clone(),
                    markers: vec![marker],
                }),
            }
        }

        Self {
            extent: [-WORLD_EXTENT, -WORLD_EXTENT, WORLD_EXTENT, WORLD_EXTENT],
            layers,
            route: route.map(RouteLine::from),
        }
    }

    /// Number of markers across all layers
    pub fn marker_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.markers.len()).sum()
    }
}

fn status_color(status: &Status) -> &'static str {
    match status {
        Status::Operating => OPERATING_COLOR,
        _ => OTHER_COLOR,
    }
}

impl From<&Terminal> for Marker {
    fn from(terminal: &Terminal) -> Self {
        let projected = terminal.mercator();
        Self {
            x: projected.x(),
            y: projected.y(),
            name: terminal.name().to_string(),
            status: terminal.status().clone(),
            parent: terminal.parent().to_string(),
            capacity_mtpa: terminal.capacity_mtpa(),
        }
    }
}

impl From<&Route> for RouteLine {
    fn from(route: &Route) -> Self {
        Self {
            points: route
                .projected_geometry()
                .iter()
                .map(|p| [p.x(), p.y()])
                .collect(),
            color: ROUTE_COLOR,
            width: ROUTE_WIDTH,
            start: route.start().to_string(),
            end: route.end().to_string(),
            duration_days: route.duration_days(),
            length_km: route.length_km_rounded(),
        }
    }
}
