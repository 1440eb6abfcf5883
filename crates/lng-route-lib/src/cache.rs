//! Explicit route memoization
//!
//! Entries are keyed on everything that influences a route: both terminal
//! names, the vessel speed and the restriction set. The cache remembers which
//! registry revision filled it and empties itself as soon as it is consulted
//! with a different one, so a reloaded registry never serves stale routes.

use crate::Route;
use crate::router::Passage;
use lru::LruCache;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Cache key for a route query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    start: String,
    end: String,
    speed_bits: u64,
    restrictions: BTreeSet<Passage>,
}

impl RouteKey {
    pub fn new(start: &str, end: &str, speed_knots: f64, restrictions: &BTreeSet<Passage>) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            speed_bits: speed_knots.to_bits(),
            restrictions: restrictions.clone(),
        }
    }
}

/// Least-recently-used store of computed routes for one registry revision
pub struct RouteCache {
    entries: LruCache<RouteKey, Arc<Route>>,
    revision: Option<u64>,
}

impl RouteCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            revision: None,
        }
    }

    /// Look up a route computed against the registry with `revision`
    pub fn get(&mut self, revision: u64, key: &RouteKey) -> Option<Arc<Route>> {
        self.sync_revision(revision);
        self.entries.get(key).cloned()
    }

    /// Store a route computed against the registry with `revision`
    pub fn insert(&mut self, revision: u64, key: RouteKey, route: Arc<Route>) {
        self.sync_revision(revision);
        self.entries.put(key, route);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.revision = None;
    }

    fn sync_revision(&mut self, revision: u64) {
        if self.revision != Some(revision) {
            if !self.entries.is_empty() {
                tracing::debug!(
                    "Registry revision changed to {revision}, dropping {} cached route(s)",
                    self.entries.len()
                );
            }
            self.entries.clear();
            self.revision = Some(revision);
        }
    }
}
