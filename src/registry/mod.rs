//! Path Registry module.
//!
//! Provides thread-safe in-memory storage of the execution paths known to the
//! engine, plus the runtime learning feedback written by the optimizer.

mod error;
mod path;

pub use error::*;
pub use path::*;

use dashmap::DashMap;

/// The Path Registry stores every configured execution path.
///
/// Paths are loaded once from configuration. Only capabilities and observed
/// latency/success values change at runtime.
///
/// # Examples
///
/// ```
/// use dualroute::registry::{Capabilities, Path, PathRegistry, ProviderKind};
///
/// let registry = PathRegistry::new();
/// let path = Path::new("direct", ProviderKind::Direct, "anthropic", Capabilities::default(), 0.8, 300);
///
/// registry.add_path(path).unwrap();
/// assert_eq!(registry.path_count(), 1);
/// ```
pub struct PathRegistry {
    paths: DashMap<String, Path>,
}

impl PathRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            paths: DashMap::new(),
        }
    }

    /// Build a registry from path configuration entries.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicatePath` when two entries share an id.
    pub fn from_config(paths: &[crate::config::PathConfig]) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for config in paths {
            registry.add_path(Path::from(config))?;
        }
        Ok(registry)
    }

    /// Add a new path.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicatePath` if a path with the same id exists.
    pub fn add_path(&self, path: Path) -> Result<(), RegistryError> {
        let id = path.id.clone();
        if self.paths.contains_key(&id) {
            return Err(RegistryError::DuplicatePath(id));
        }
        self.paths.insert(id, path);
        Ok(())
    }

    /// Remove a path.
    pub fn remove_path(&self, id: &str) -> Result<Path, RegistryError> {
        self.paths
            .remove(id)
            .map(|(_, path)| path)
            .ok_or_else(|| RegistryError::PathNotFound(id.to_string()))
    }

    /// Get a copy of a path by id.
    pub fn get_path(&self, id: &str) -> Option<Path> {
        self.paths.get(id).map(|entry| entry.value().clone())
    }

    /// Whether a path with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.paths.contains_key(id)
    }

    /// All paths, ordered by id so callers see a deterministic candidate set.
    pub fn all_paths(&self) -> Vec<Path> {
        let mut paths: Vec<Path> = self
            .paths
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        paths.sort_by(|a, b| a.id.cmp(&b.id));
        paths
    }

    /// All path ids, sorted.
    pub fn path_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.paths.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Replace the capability set of a path.
    pub fn update_capabilities(
        &self,
        id: &str,
        capabilities: Capabilities,
    ) -> Result<(), RegistryError> {
        let mut path = self
            .paths
            .get_mut(id)
            .ok_or_else(|| RegistryError::PathNotFound(id.to_string()))?;
        path.capabilities = capabilities;
        Ok(())
    }

    /// Record observed latency and success rate for a path.
    ///
    /// Success rate is clamped to 0.0–1.0.
    pub fn record_observation(
        &self,
        id: &str,
        latency_ms: u32,
        success_rate: f64,
    ) -> Result<(), RegistryError> {
        let mut path = self
            .paths
            .get_mut(id)
            .ok_or_else(|| RegistryError::PathNotFound(id.to_string()))?;
        path.observed_latency_ms = Some(latency_ms);
        path.observed_success_rate = Some(success_rate.clamp(0.0, 1.0));
        path.observed_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// Drop learned observations, reverting routing to declared values.
    pub fn clear_observation(&self, id: &str) -> Result<(), RegistryError> {
        let mut path = self
            .paths
            .get_mut(id)
            .ok_or_else(|| RegistryError::PathNotFound(id.to_string()))?;
        path.observed_latency_ms = None;
        path.observed_success_rate = None;
        path.observed_at = None;
        Ok(())
    }
}

impl Default for PathRegistry {
    fn default() -> Self {
        Self::new()
    }
}
