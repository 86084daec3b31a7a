//! Totals and tax calculation for document line items.
//!
//! Amounts are kept as exact decimals throughout; nothing is rounded here.
//! Rounding for display is left to whatever renders the figures.

pub mod aggregate;
pub mod common;

pub use aggregate::{
    AggregationResult, Aggregator, BucketTotal, BucketTotals, RowTotal, TaxBucket, aggregate,
};
