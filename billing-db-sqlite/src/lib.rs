//! SQLite storage for the company profile.

pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
