//! CSV import for line items and the company profile.

pub mod line_items;
pub mod loader;

pub use line_items::{LineItemLoader, LineItemLoaderError};
pub use loader::{ProfileLoader, ProfileLoaderError, ProfileRecord};
