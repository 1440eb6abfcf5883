//! Terminal entity and its enumerated attributes

use crate::projection::{self, Crs};
use geo::Point;
use serde::{Serialize, Serializer};
use std::fmt;

/// Lifecycle status of a terminal
///
/// Known values are matched case-insensitively; anything else is kept verbatim
/// in [`Status::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Operating,
    Construction,
    Proposed,
    Shelved,
    Cancelled,
    Idle,
    Mothballed,
    Retired,
    Other(String),
}

impl Status {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "operating" => Self::Operating,
            "construction" => Self::Construction,
            "proposed" => Self::Proposed,
            "shelved" => Self::Shelved,
            "cancelled" => Self::Cancelled,
            "idle" => Self::Idle,
            "mothballed" => Self::Mothballed,
            "retired" => Self::Retired,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Operating => "Operating",
            Self::Construction => "Construction",
            Self::Proposed => "Proposed",
            Self::Shelved => "Shelved",
            Self::Cancelled => "Cancelled",
            Self::Idle => "Idle",
            Self::Mothballed => "Mothballed",
            Self::Retired => "Retired",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Whether a terminal liquefies (export) or regasifies (import)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacilityType {
    Export,
    Import,
    Other(String),
}

impl FacilityType {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "export" => Self::Export,
            "import" => Self::Import,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Export => "Export",
            Self::Import => "Import",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FacilityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One physical LNG facility, or one unit of a facility
///
/// Immutable once constructed. The Web Mercator position is computed a single
/// time here so that plotting never reprojects terminals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Terminal {
    name: String,
    facility_type: FacilityType,
    status: Status,
    parent: String,
    capacity_mtpa: f64,
    latitude: f64,
    longitude: f64,
    mercator_x: f64,
    mercator_y: f64,
}

impl Terminal {
    /// Create a terminal from already validated fields
    ///
    /// Latitude and longitude must be finite WGS84 degrees.
    pub fn new(
        name: String,
        facility_type: FacilityType,
        status: Status,
        parent: String,
        capacity_mtpa: f64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        let mercator = projection::project(
            Point::new(longitude, latitude),
            Crs::Wgs84,
            Crs::WebMercator,
        );
        Self {
            name,
            facility_type,
            status,
            parent,
            capacity_mtpa,
            latitude,
            longitude,
            mercator_x: mercator.x(),
            mercator_y: mercator.y(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn facility_type(&self) -> &FacilityType {
        &self.facility_type
    }

    #[inline]
    pub fn status(&self) -> &Status {
        &self.status
    }

    #[inline]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    #[inline]
    pub fn capacity_mtpa(&self) -> f64 {
        self.capacity_mtpa
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Geographic position as (lon, lat)
    #[inline]
    pub fn position(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Display position in Web Mercator meters
    #[inline]
    pub fn mercator(&self) -> Point<f64> {
        Point::new(self.mercator_x, self.mercator_y)
    }
}
