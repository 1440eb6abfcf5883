//! File-backed registry reuse keyed on modification time

use crate::{LoadError, TerminalRegistry};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

type Loaded = (SystemTime, Arc<TerminalRegistry>);

/// Keeps the last registry loaded from a CSV file
///
/// [`RegistryCache::get`] hands out the cached registry while the file's
/// modification time is unchanged and reloads it otherwise. Every reload
/// produces a registry with a fresh revision, which invalidates any route
/// cache filled from the previous one.
pub struct RegistryCache {
    path: PathBuf,
    state: RwLock<Option<Loaded>>,
}

impl RegistryCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(None),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current registry, reloading the file if it changed since the last call
    pub fn get(&self) -> Result<Arc<TerminalRegistry>, LoadError> {
        let modified = std::fs::metadata(&self.path)?.modified()?;

        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((loaded_at, registry)) = state.as_ref() {
                if *loaded_at == modified {
                    return Ok(Arc::clone(registry));
                }
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have reloaded while we waited for the lock
        if let Some((loaded_at, registry)) = state.as_ref() {
            if *loaded_at == modified {
                return Ok(Arc::clone(registry));
            }
        }

        if state.is_some() {
            tracing::info!("{} changed, reloading terminals", self.path.display());
        }
        let registry = Arc::new(TerminalRegistry::load_path(&self.path)?);
        *state = Some((modified, Arc::clone(&registry)));
        Ok(registry)
    }

    /// Drop the cached registry so the next [`RegistryCache::get`] reloads
    pub fn invalidate(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
