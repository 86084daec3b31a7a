use async_trait::async_trait;

use billing_core::db::repository::{ProfileRepository, RepositoryError};
use billing_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Turns a connection string into a sqlx URL.
///
/// * `":memory:"` becomes `sqlite::memory:`.
/// * Anything already starting with `sqlite:` is used as given.
/// * A bare path is opened read-write and created if missing.
pub fn database_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else {
        format!("sqlite:{trimmed}?mode=rwc")
    }
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`billing_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use billing_core::db::RepositoryRegistry;
/// use billing_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` (see
    /// [`database_url`]) and bring its schema up to date.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ProfileRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&database_url(&config.connection_string))
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}
