use async_trait::async_trait;
use thiserror::Error;

use crate::error::DocumentError;
use crate::models::CompanyProfile;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Store holding the single active company profile.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// The profile on record, or `None` if none has been saved yet.
    async fn get_profile(&self) -> Result<Option<CompanyProfile>, RepositoryError>;

    /// Inserts the profile, or replaces the one on record.
    async fn save_profile(
        &self,
        profile: &CompanyProfile,
    ) -> Result<(), RepositoryError>;

    /// Removes the profile on record.
    ///
    /// Returns [`RepositoryError::NotFound`] when there is nothing to remove.
    async fn delete_profile(&self) -> Result<(), RepositoryError>;

    /// Like [`get_profile`](Self::get_profile), but a missing profile is an
    /// error: a document cannot be generated without one.
    async fn require_profile(&self) -> Result<CompanyProfile, DocumentError> {
        self.get_profile()
            .await?
            .ok_or(DocumentError::ProfileUnavailable)
    }
}
