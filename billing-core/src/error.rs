use thiserror::Error;

use crate::db::repository::RepositoryError;

/// Errors raised while turning a document request into sheet values.
///
/// Every variant is fatal to the single generation attempt that raised it;
/// nothing that was already stored (such as the company profile) is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// A numeric field of a line item could not be parsed.
    ///
    /// `row` is 1-based, in the order the items were entered.
    #[error("line item {row}: {field} '{value}' is not a number")]
    InvalidLineItem {
        row: usize,
        field: &'static str,
        value: String,
    },

    /// A row or running total does not fit in a `Decimal`.
    ///
    /// `row` is the line item whose figures pushed the amount out of range.
    #[error("line item {row}: amount is out of range")]
    AmountOutOfRange { row: usize },

    #[error("unknown document type '{0}' (expected estimate, invoice or receipt)")]
    UnknownDocumentType(String),

    /// No company profile is on record; it has to be configured first.
    #[error("no company profile on record")]
    ProfileUnavailable,

    /// The layout has fewer item rows than the request has line items.
    #[error("{count} line items do not fit the {capacity} item rows of the layout")]
    TooManyLineItems { count: usize, capacity: usize },

    #[error("profile store error: {0}")]
    Repository(#[from] RepositoryError),
}
