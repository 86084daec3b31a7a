use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{ProfileRepository, RepositoryError};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is passed through to that
/// factory unchanged; its meaning is backend-specific.
///
/// | backend    | connection_string examples                   |
/// |------------|----------------------------------------------|
/// | `sqlite`   | `documents.db`, `:memory:`, `sqlite:x.db`    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// One implementation per storage backend, registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) the store and return a ready-to-use repository.
    /// Implementations may run migrations here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ProfileRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] — no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ProfileRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        debug!(backend = %config.backend, "Opening profile store");
        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
