//! RouteProjector - Terminal-to-terminal routing for display
//!
//! Resolves two terminal names against an explicitly passed registry, asks a
//! [`MaritimeRouter`] for a route and turns the response into a [`Route`].

use crate::cache::{RouteCache, RouteKey};
use crate::router::{MaritimeRouter, Passage, RouteRequest};
use crate::{Endpoint, Error, Result, Route, TerminalRegistry};

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

/// Default vessel speed in knots
pub const DEFAULT_SPEED_KNOTS: f64 = 15.0;

/// User-selected routing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOptions {
    /// Vessel speed in knots, must be positive (default 15)
    pub speed_knots: f64,
    /// Passages to avoid in addition to the always-restricted Northwest Passage
    pub restricted_passages: BTreeSet<Passage>,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            speed_knots: DEFAULT_SPEED_KNOTS,
            restricted_passages: BTreeSet::new(),
        }
    }
}

impl RouteOptions {
    /// Restrictions sent to the router, including the implicit Northwest Passage
    pub fn restrictions(&self) -> BTreeSet<Passage> {
        let mut restrictions = self.restricted_passages.clone();
        restrictions.insert(Passage::Northwest);
        restrictions
    }

    fn validate(&self) -> Result<()> {
        if !self.speed_knots.is_finite() || self.speed_knots <= 0.0 {
            return Err(Error::InvalidOptions {
                reason: format!("speed must be a positive number of knots, got {}", self.speed_knots),
            });
        }
        Ok(())
    }
}

/// Computes display-ready routes between registry terminals
pub struct RouteProjector<R> {
    router: R,
    cache: Option<Mutex<RouteCache>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<R: MaritimeRouter> RouteProjector<R> {
    /// Create a projector without memoization
    pub fn new(router: R) -> Self {
        Self {
            router,
            cache: None,
        }
    }

    /// Create a projector that remembers up to `capacity` routes
    ///
    /// Cached routes are dropped whenever a registry with a different revision
    /// is passed to [`RouteProjector::compute_route`].
    pub fn with_cache(router: R, capacity: NonZeroUsize) -> Self {
        Self {
            router,
            cache: Some(Mutex::new(RouteCache::new(capacity))),
        }
    }

    #[inline]
    pub fn router(&self) -> &R {
        &self.router
    }

    /// Forget every cached route
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Compute the route between two terminals
    ///
    /// Both names must resolve in `registry`; the start terminal is checked
    /// first and the router is not called when either is unknown.
    pub fn compute_route(
        &self,
        registry: &TerminalRegistry,
        start_name: &str,
        end_name: &str,
        options: &RouteOptions,
    ) -> Result<Arc<Route>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("projector::compute_route");

        let start = registry
            .by_name(start_name)
            .map_err(|_| Error::UnknownTerminal {
                name: start_name.to_string(),
                endpoint: Endpoint::Start,
            })?;
        let end = registry
            .by_name(end_name)
            .map_err(|_| Error::UnknownTerminal {
                name: end_name.to_string(),
                endpoint: Endpoint::End,
            })?;
        options.validate()?;

        let restrictions = options.restrictions();
        let key = RouteKey::new(start_name, end_name, options.speed_knots, &restrictions);

        if let Some(cache) = &self.cache {
            let hit = cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(registry.revision(), &key);
            if let Some(route) = hit {
                tracing::debug!("Route cache hit for {start_name} -> {end_name}");
                return Ok(route);
            }
        }

        let request = RouteRequest {
            origin: start.position(),
            destination: end.position(),
            speed_knots: options.speed_knots,
            restrictions: restrictions.clone(),
        };
        tracing::debug!(
            "Routing {start_name} -> {end_name} via {} at {} kn avoiding {:?}",
            self.router.name(),
            options.speed_knots,
            restrictions
        );

        let response = self.router.route(&request)?;
        let route = Route::from_response(
            start.name(),
            end.name(),
            options.speed_knots,
            restrictions,
            response,
        )?;

        tracing::info!(
            "Route {} -> {}: {} days, {} km, {} waypoint(s)",
            route.start(),
            route.end(),
            route.duration_days(),
            route.length_km_rounded(),
            route.geometry().len()
        );

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(registry.revision(), key, Arc::clone(&route));
        }

        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{RouteResponse, RoutingError};
    use geo::Point;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Straight two-point router that records every request it receives
    #[derive(Default)]
    struct RecordingRouter {
        calls: AtomicUsize,
        last: Mutex<Option<RouteRequest>>,
    }

    impl RecordingRouter {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MaritimeRouter for RecordingRouter {
        fn name(&self) -> &str {
            "recording"
        }

        fn route(
            &self,
            request: &RouteRequest,
        ) -> std::result::Result<RouteResponse, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(RouteResponse {
                geometry: vec![
                    request.origin,
                    Point::new(32.35, 30.6),
                    request.destination,
                ],
                duration_hours: 333.0,
                length_km: 11234.4,
            })
        }
    }

    struct FailingRouter;

    impl MaritimeRouter for FailingRouter {
        fn name(&self) -> &str {
            "failing"
        }

        fn route(
            &self,
            _request: &RouteRequest,
        ) -> std::result::Result<RouteResponse, RoutingError> {
            Err(RoutingError::NoRoute {
                reason: "all passages closed".to_string(),
            })
        }
    }

    fn registry() -> TerminalRegistry {
        let csv = "TerminalName,UnitName,FacilityType,Status,Parent,CapacityInMtpa,Latitude,Longitude\n\
                   Ras Laffan,,Export,Operating,QatarEnergy,77,25.9,51.6\n\
                   Zeebrugge,,Import,Operating,Fluxys,6.6,51.33,3.2\n";
        TerminalRegistry::load(csv.as_bytes()).unwrap()
    }

    fn suez() -> RouteOptions {
        RouteOptions {
            speed_knots: 15.0,
            restricted_passages: BTreeSet::from([Passage::Suez]),
        }
    }

    #[test]
    fn test_route_is_projected_with_metrics() {
        let projector = RouteProjector::new(RecordingRouter::default());
        let route = projector
            .compute_route(&registry(), "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();

        assert_eq!(route.projected_geometry().len(), route.geometry().len());
        let expected_days = ((333.0_f64 / 24.0) * 100.0).round() / 100.0;
        assert_eq!(route.duration_days(), expected_days);
        assert_eq!(route.length_km_rounded(), 11234.0);
    }

    #[test]
    fn test_router_receives_geographic_coordinates_and_restrictions() {
        let projector = RouteProjector::new(RecordingRouter::default());
        projector
            .compute_route(&registry(), "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();

        let request = projector.router().last.lock().unwrap().clone().unwrap();
        assert_eq!(request.origin, Point::new(51.6, 25.9));
        assert_eq!(request.destination, Point::new(3.2, 51.33));
        assert_eq!(request.speed_knots, 15.0);
        assert_eq!(
            request.restrictions,
            BTreeSet::from([Passage::Suez, Passage::Northwest])
        );
    }

    #[test]
    fn test_unknown_start_skips_router() {
        let projector = RouteProjector::new(RecordingRouter::default());
        let result = projector.compute_route(&registry(), "Atlantis", "Zeebrugge", &suez());

        match result {
            Err(Error::UnknownTerminal { name, endpoint }) => {
                assert_eq!(name, "Atlantis");
                assert_eq!(endpoint, Endpoint::Start);
            }
            other => panic!("expected unknown terminal, got {other:?}"),
        }
        assert_eq!(projector.router().calls(), 0);
    }

    #[test]
    fn test_unknown_end_is_named() {
        let projector = RouteProjector::new(RecordingRouter::default());
        let result = projector.compute_route(&registry(), "Ras Laffan", "Atlantis", &suez());
        assert!(matches!(
            result,
            Err(Error::UnknownTerminal { endpoint: Endpoint::End, ref name }) if name == "Atlantis"
        ));
        assert_eq!(projector.router().calls(), 0);
    }

    #[test]
    fn test_invalid_speed_is_rejected() {
        let projector = RouteProjector::new(RecordingRouter::default());
        let options = RouteOptions {
            speed_knots: 0.0,
            ..Default::default()
        };
        let result = projector.compute_route(&registry(), "Ras Laffan", "Zeebrugge", &options);
        assert!(matches!(result, Err(Error::InvalidOptions { .. })));
        assert_eq!(projector.router().calls(), 0);
    }

    #[test]
    fn test_routing_failure_is_surfaced() {
        let projector = RouteProjector::new(FailingRouter);
        let result = projector.compute_route(&registry(), "Ras Laffan", "Zeebrugge", &suez());
        assert!(matches!(
            result,
            Err(Error::Routing(RoutingError::NoRoute { .. }))
        ));
    }

    #[test]
    fn test_cache_avoids_second_router_call() {
        let projector =
            RouteProjector::with_cache(RecordingRouter::default(), NonZeroUsize::new(8).unwrap());
        let registry = registry();

        let first = projector
            .compute_route(&registry, "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();
        let second = projector
            .compute_route(&registry, "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(projector.router().calls(), 1);

        // Different parameters are a different query
        projector
            .compute_route(&registry, "Ras Laffan", "Zeebrugge", &RouteOptions::default())
            .unwrap();
        assert_eq!(projector.router().calls(), 2);
    }

    #[test]
    fn test_cache_invalidated_by_reload() {
        let projector =
            RouteProjector::with_cache(RecordingRouter::default(), NonZeroUsize::new(8).unwrap());

        projector
            .compute_route(&registry(), "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();
        // A freshly loaded registry has a new revision
        projector
            .compute_route(&registry(), "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();
        assert_eq!(projector.router().calls(), 2);
    }

    #[test]
    fn test_clear_cache() {
        let projector =
            RouteProjector::with_cache(RecordingRouter::default(), NonZeroUsize::new(8).unwrap());
        let registry = registry();
        projector
            .compute_route(&registry, "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();
        projector.clear_cache();
        projector
            .compute_route(&registry, "Ras Laffan", "Zeebrugge", &suez())
            .unwrap();
        assert_eq!(projector.router().calls(), 2);
    }

    #[test]
    fn test_default_options() {
        let options = RouteOptions::default();
        assert_eq!(options.speed_knots, 15.0);
        assert_eq!(options.restrictions(), BTreeSet::from([Passage::Northwest]));
    }
}
