//! Shared helpers for reading numeric text typed into a line item.

use rust_decimal::Decimal;

use crate::error::DocumentError;

/// Parses a required numeric field of line item `row`.
///
/// Surrounding whitespace is ignored. A blank field is an error.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use billing_core::calculations::common::parse_field;
///
/// assert_eq!(parse_field(1, "quantity", " 2.5 ").unwrap(), dec!(2.5));
/// assert!(parse_field(1, "quantity", "").is_err());
/// assert!(parse_field(1, "quantity", "abc").is_err());
/// ```
pub fn parse_field(
    row: usize,
    field: &'static str,
    text: &str,
) -> Result<Decimal, DocumentError> {
    text.trim()
        .parse::<Decimal>()
        .map_err(|_| DocumentError::InvalidLineItem {
            row,
            field,
            value: text.to_string(),
        })
}

/// Like [`parse_field`], but a blank field reads as zero.
///
/// Used for the discount and the tax rate, which may be left out.
///
/// ```
/// use rust_decimal_macros::dec;
/// use billing_core::calculations::common::parse_field_or_zero;
///
/// assert_eq!(parse_field_or_zero(1, "discount", "  ").unwrap(), dec!(0));
/// assert_eq!(parse_field_or_zero(1, "discount", "50").unwrap(), dec!(50));
/// ```
pub fn parse_field_or_zero(
    row: usize,
    field: &'static str,
    text: &str,
) -> Result<Decimal, DocumentError> {
    if text.trim().is_empty() {
        return Ok(Decimal::ZERO);
    }
    parse_field(row, field, text)
}

/// Converts a percentage (`10`) to a fraction (`0.10`).
pub fn percent_to_rate(percent: Decimal) -> Decimal {
    percent / Decimal::ONE_HUNDRED
}
