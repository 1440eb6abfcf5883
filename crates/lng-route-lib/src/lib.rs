//! LNG Route Library - Terminal registry and sea-route projection
//!
//! This library turns a messy spreadsheet export of LNG terminals into a clean, queryable
//! registry, and turns the response of a maritime routing backend into display-ready
//! geometry in Web Mercator coordinates with derived transit metrics.
//!
//! # Architecture
//!
//! - **[`TerminalRegistry`]**: Normalized, immutable collection of [`Terminal`]s loaded from CSV
//! - **[`RouteProjector`]**: Resolves two terminals, queries a [`MaritimeRouter`] and builds a [`Route`]
//! - **[`MaritimeRouter`]**: Routing capability, with [`GreatCircleRouter`], [`CommandRouter`]
//!   and [`TimeoutRouter`] implementations
//! - **[`RouteCache`]** / **[`RegistryCache`]**: Optional explicit caches with revision/mtime invalidation
//! - **[`MapScene`]**: Serializable input for a map renderer (markers grouped by status + route line)
//!
//! # Example
//!
//! ```rust
//! use lng_route_lib::{GreatCircleRouter, RouteOptions, RouteProjector, TerminalRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let csv = "TerminalName,UnitName,FacilityType,Status,Parent,CapacityInMtpa,Latitude,Longitude\n\
//!            Sabine Pass,,Export,Operating,Cheniere,30,29.74,-93.87\n\
//!            Zeebrugge,,Import,Operating,Fluxys,6.6,51.33,3.2\n";
//! let registry = TerminalRegistry::load(csv.as_bytes())?;
//!
//! let projector = RouteProjector::new(GreatCircleRouter::default());
//! let route = projector.compute_route(&registry, "Sabine Pass", "Zeebrugge", &RouteOptions::default())?;
//! assert_eq!(route.geometry().len(), route.projected_geometry().len());
//! # Ok(())
//! # }
//! ```

mod cache;
mod projector;
pub mod projection;
mod record;
mod registry;
mod registry_cache;
mod route;
pub mod router;
mod scene;
mod terminal;

// Public API exports
pub use cache::{RouteCache, RouteKey};
pub use projection::Crs;
pub use projector::{DEFAULT_SPEED_KNOTS, RouteOptions, RouteProjector};
pub use record::LoadReport;
pub use registry::{RegistryInfo, TerminalFilter, TerminalRegistry};
pub use registry_cache::RegistryCache;
pub use route::Route;
pub use router::{
    CommandRouter, CommandRouterConfig, GreatCircleConfig, GreatCircleRouter, MaritimeRouter,
    Passage, RouteRequest, RouteResponse, RoutingError, TimeoutRouter,
};
pub use scene::{MapScene, Marker, MarkerLayer, RouteLine, WORLD_EXTENT};
pub use terminal::{FacilityType, Status, Terminal};

use std::fmt;

/// Errors raised while reading a terminal source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {column}")]
    MissingColumn { column: &'static str },
}

/// Which side of a route a terminal name was given for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::End => f.write_str("end"),
        }
    }
}

/// Error types for the library
///
/// Every variant is a user-facing condition: callers report the message and
/// go back to waiting for the next request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to load terminals: {0}")]
    Load(#[from] LoadError),

    #[error("Terminal not found: {name:?}")]
    NotFound { name: String },

    #[error("Unknown {endpoint} terminal: {name:?}")]
    UnknownTerminal { name: String, endpoint: Endpoint },

    #[error("Invalid route options: {reason}")]
    InvalidOptions { reason: String },

    #[error("Routing failed: {0}")]
    Routing(#[from] RoutingError),
}

pub type Result<T> = std::result::Result<T, Error>;
