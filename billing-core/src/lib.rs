pub mod calculations;
pub mod cells;
pub mod compose;
pub mod db;
pub mod error;
pub mod layout;
pub mod models;

pub use calculations::{AggregationResult, Aggregator, BucketTotal, BucketTotals, TaxBucket, aggregate};
pub use compose::{ComposedDocument, compose};
pub use db::repository::{ProfileRepository, RepositoryError};
pub use error::DocumentError;
pub use layout::{DocumentLayout, LayoutTable};
pub use models::*;
