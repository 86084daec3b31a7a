//! Line-item aggregation for estimates, invoices and receipts.
//!
//! Turns the line items of one document into the figures printed in its
//! totals block.
//!
//! # Figures
//!
//! | Figure | Definition |
//! |--------|------------|
//! | Row subtotal | quantity × unit price − discount |
//! | Row tax | row subtotal × row tax rate |
//! | Total excluding tax | Σ row subtotals |
//! | Total tax | Σ row taxes |
//! | Total including tax | total excluding tax + total tax |
//! | Bucket subtotal | Σ row subtotals of the rows in the bucket |
//! | Bucket tax | bucket subtotal × the bucket's nominal rate |
//!
//! Rows are put in one of three buckets: 10%, 8%, and everything else
//! (0% or no rate given). Tax for the grand total is summed per row, while
//! bucket tax is recomputed from the bucket subtotal. The two agree as long
//! as every row uses 10%, 8% or 0%; a row with any other rate lands in the
//! 0% bucket but still adds its tax to the grand total. Both figures are
//! kept as they are and [`AggregationResult::tax_divergence`] reports the
//! gap.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use billing_core::{LineItemInput, aggregate};
//!
//! let items = vec![LineItemInput {
//!     description: "Widget".to_string(),
//!     quantity: "2".to_string(),
//!     unit: "pcs".to_string(),
//!     unit_price: "1000".to_string(),
//!     discount: String::new(),
//!     tax_rate: "10".to_string(),
//! }];
//!
//! let result = aggregate("invoice", &items, "").unwrap();
//!
//! assert_eq!(result.total_excluding_tax, dec!(2000));
//! assert_eq!(result.total_tax, dec!(200));
//! assert_eq!(result.total_including_tax, dec!(2200));
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DocumentError;
use crate::models::{DocumentType, LineItem, LineItemInput};

/// Tax-rate group reported separately on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxBucket {
    /// 10%
    Standard,
    /// 8%
    Reduced,
    /// 0% or no rate given
    Exempt,
}

impl TaxBucket {
    /// Buckets in the order they are printed.
    pub const ALL: [TaxBucket; 3] = [Self::Standard, Self::Reduced, Self::Exempt];

    pub fn nominal_rate(&self) -> Decimal {
        match self {
            Self::Standard => Decimal::new(10, 2),
            Self::Reduced => Decimal::new(8, 2),
            Self::Exempt => Decimal::ZERO,
        }
    }

    /// Bucket a row with the given tax rate (as a fraction) falls into.
    pub fn for_rate(rate: Decimal) -> Self {
        if rate == Self::Standard.nominal_rate() {
            Self::Standard
        } else if rate == Self::Reduced.nominal_rate() {
            Self::Reduced
        } else {
            Self::Exempt
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "10%",
            Self::Reduced => "8%",
            Self::Exempt => "0%",
        }
    }
}

/// Figures for a single line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTotal {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub bucket: TaxBucket,
}

/// Subtotal and tax of one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotal {
    pub subtotal: Decimal,
    pub tax: Decimal,
    /// Number of rows that fell into the bucket.
    pub rows: usize,
}

/// The three bucket totals, always present even when zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    pub standard: BucketTotal,
    pub reduced: BucketTotal,
    pub exempt: BucketTotal,
}

impl BucketTotals {
    pub fn get(
        &self,
        bucket: TaxBucket,
    ) -> &BucketTotal {
        match bucket {
            TaxBucket::Standard => &self.standard,
            TaxBucket::Reduced => &self.reduced,
            TaxBucket::Exempt => &self.exempt,
        }
    }

    fn get_mut(
        &mut self,
        bucket: TaxBucket,
    ) -> &mut BucketTotal {
        match bucket {
            TaxBucket::Standard => &mut self.standard,
            TaxBucket::Reduced => &mut self.reduced,
            TaxBucket::Exempt => &mut self.exempt,
        }
    }

    /// Buckets that received at least one row, in print order.
    pub fn entries(&self) -> impl Iterator<Item = (TaxBucket, &BucketTotal)> {
        TaxBucket::ALL
            .into_iter()
            .map(|bucket| (bucket, self.get(bucket)))
            .filter(|(_, total)| total.rows > 0)
    }

    pub fn subtotal_sum(&self) -> Decimal {
        TaxBucket::ALL
            .iter()
            .fold(Decimal::ZERO, |acc, b| acc.saturating_add(self.get(*b).subtotal))
    }

    pub fn tax_sum(&self) -> Decimal {
        TaxBucket::ALL
            .iter()
            .fold(Decimal::ZERO, |acc, b| acc.saturating_add(self.get(*b).tax))
    }
}

/// Everything computed for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub document_type: DocumentType,

    /// One entry per line item, in input order.
    pub rows: Vec<RowTotal>,

    pub total_excluding_tax: Decimal,
    /// Sum of the per-row tax amounts.
    pub total_tax: Decimal,
    pub total_including_tax: Decimal,

    pub buckets: BucketTotals,

    /// Trimmed remarks, `None` when blank.
    pub remarks: Option<String>,
}

impl AggregationResult {
    /// Tax as recomputed from the bucket subtotals.
    pub fn bucket_tax_total(&self) -> Decimal {
        self.buckets.tax_sum()
    }

    /// Per-row tax total minus bucket tax total.
    ///
    /// Non-zero only when some row has a rate other than 10%, 8% or 0%.
    pub fn tax_divergence(&self) -> Decimal {
        self.total_tax.saturating_sub(self.bucket_tax_total())
    }
}

/// Aggregates parsed line items for one document type.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    document_type: DocumentType,
}

impl Aggregator {
    pub fn new(document_type: DocumentType) -> Self {
        Self { document_type }
    }

    /// Computes row, bucket and grand totals.
    ///
    /// Pure: the same items and remarks always give the same result.
    ///
    /// # Errors
    ///
    /// [`DocumentError::AmountOutOfRange`] when a row figure or a running
    /// total no longer fits in a `Decimal`.
    pub fn calculate(
        &self,
        items: &[LineItem],
        remarks: &str,
    ) -> Result<AggregationResult, DocumentError> {
        let rows = self.row_totals(items)?;

        let total_excluding_tax = checked_sum(rows.iter().map(|r| r.subtotal))?;
        let total_tax = checked_sum(rows.iter().map(|r| r.tax))?;
        let total_including_tax = total_excluding_tax
            .checked_add(total_tax)
            .ok_or(DocumentError::AmountOutOfRange { row: rows.len() })?;

        let buckets = self.bucket_totals(&rows)?;
        let bucket_tax = checked_sum(TaxBucket::ALL.iter().map(|b| buckets.get(*b).tax))
            .map_err(|_| DocumentError::AmountOutOfRange { row: rows.len() })?;
        let divergence = total_tax
            .checked_sub(bucket_tax)
            .ok_or(DocumentError::AmountOutOfRange { row: rows.len() })?;

        let result = AggregationResult {
            document_type: self.document_type,
            rows,
            total_excluding_tax,
            total_tax,
            total_including_tax,
            buckets,
            remarks: Some(remarks.trim())
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        };

        if !divergence.is_zero() {
            warn!(
                document_type = %self.document_type,
                total_tax = %result.total_tax,
                bucket_tax = %bucket_tax,
                divergence = %divergence,
                "Row tax total differs from bucket tax total; some rows use a rate outside 10%/8%/0%"
            );
        }

        debug!(
            document_type = %self.document_type,
            rows = result.rows.len(),
            total_excluding_tax = %result.total_excluding_tax,
            total_tax = %result.total_tax,
            total_including_tax = %result.total_including_tax,
            "Aggregated line items"
        );

        Ok(result)
    }

    fn row_totals(
        &self,
        items: &[LineItem],
    ) -> Result<Vec<RowTotal>, DocumentError> {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let row = idx + 1;
                Ok(RowTotal {
                    subtotal: item.subtotal().ok_or(DocumentError::AmountOutOfRange { row })?,
                    tax: item.tax().ok_or(DocumentError::AmountOutOfRange { row })?,
                    bucket: TaxBucket::for_rate(item.tax_rate),
                })
            })
            .collect()
    }

    /// Sums subtotals per bucket, then applies each bucket's nominal rate.
    fn bucket_totals(
        &self,
        rows: &[RowTotal],
    ) -> Result<BucketTotals, DocumentError> {
        let mut totals = BucketTotals::default();

        for (idx, row) in rows.iter().enumerate() {
            let total = totals.get_mut(row.bucket);
            total.subtotal = total
                .subtotal
                .checked_add(row.subtotal)
                .ok_or(DocumentError::AmountOutOfRange { row: idx + 1 })?;
            total.rows += 1;
        }

        for bucket in TaxBucket::ALL {
            let total = totals.get_mut(bucket);
            total.tax = total
                .subtotal
                .checked_mul(bucket.nominal_rate())
                .ok_or(DocumentError::AmountOutOfRange { row: rows.len() })?;
        }

        Ok(totals)
    }
}

/// Adds up per-row figures in row order.
fn checked_sum(values: impl Iterator<Item = Decimal>) -> Result<Decimal, DocumentError> {
    values
        .enumerate()
        .try_fold(Decimal::ZERO, |acc, (idx, value)| {
            acc.checked_add(value)
                .ok_or(DocumentError::AmountOutOfRange { row: idx + 1 })
        })
}

/// Parses the document type and the line items, then aggregates.
///
/// Nothing is computed unless every item parses.
///
/// # Errors
///
/// * [`DocumentError::UnknownDocumentType`] — `document_type` is not one of
///   the three recognised types.
/// * [`DocumentError::InvalidLineItem`] — a quantity or unit price is
///   missing, or any numeric field is not a number.
/// * [`DocumentError::AmountOutOfRange`] — the figures overflow `Decimal`.
pub fn aggregate(
    document_type: &str,
    items: &[LineItemInput],
    remarks: &str,
) -> Result<AggregationResult, DocumentError> {
    let document_type = DocumentType::from_str(document_type)?;
    let items = LineItemInput::parse_all(items)?;

    Aggregator::new(document_type).calculate(&items, remarks)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;

    fn item(
        quantity: &str,
        unit_price: &str,
        discount: &str,
        tax_rate: &str,
    ) -> LineItemInput {
        LineItemInput {
            description: "Item".to_string(),
            quantity: quantity.to_string(),
            unit: "pcs".to_string(),
            unit_price: unit_price.to_string(),
            discount: discount.to_string(),
            tax_rate: tax_rate.to_string(),
        }
    }

    fn bucket(
        subtotal: Decimal,
        tax: Decimal,
        rows: usize,
    ) -> BucketTotal {
        BucketTotal {
            subtotal,
            tax,
            rows,
        }
    }

    /// Initializes tracing subscriber for tests that verify log output.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // =========================================================================
    // Worked scenarios
    // =========================================================================

    #[test]
    fn single_standard_rate_item() {
        let result = aggregate("estimate", &[item("2", "1000", "0", "10")], "").unwrap();

        assert_eq!(result.rows[0].subtotal, dec!(2000));
        assert_eq!(result.total_excluding_tax, dec!(2000));
        assert_eq!(result.total_tax, dec!(200));
        assert_eq!(result.total_including_tax, dec!(2200));
        assert_eq!(result.buckets.standard, bucket(dec!(2000), dec!(200), 1));
        assert_eq!(result.buckets.reduced, bucket(dec!(0), dec!(0), 0));
        assert_eq!(result.buckets.exempt, bucket(dec!(0), dec!(0), 0));
    }

    #[test]
    fn standard_and_reduced_items() {
        let items = vec![item("1", "1000", "", "10"), item("5", "100", "", "8")];

        let result = aggregate("invoice", &items, "").unwrap();

        assert_eq!(result.buckets.standard, bucket(dec!(1000), dec!(100), 1));
        assert_eq!(result.buckets.reduced, bucket(dec!(500), dec!(40), 1));
        assert_eq!(result.total_excluding_tax, dec!(1500));
        assert_eq!(result.total_tax, dec!(140));
        assert_eq!(result.total_including_tax, dec!(1640));
    }

    #[test]
    fn blank_tax_rate_goes_to_exempt_bucket() {
        let result = aggregate("receipt", &[item("3", "300", "", "")], "").unwrap();

        assert_eq!(result.rows[0].bucket, TaxBucket::Exempt);
        assert_eq!(result.buckets.exempt, bucket(dec!(900), dec!(0), 1));
        assert_eq!(result.total_tax, dec!(0));
        assert_eq!(result.total_including_tax, dec!(900));
    }

    #[test]
    fn unparseable_quantity_fails_without_result() {
        let items = vec![item("1", "100", "", "10"), item("abc", "100", "", "10")];

        let result = aggregate("estimate", &items, "");

        assert_eq!(
            result,
            Err(DocumentError::InvalidLineItem {
                row: 2,
                field: "quantity",
                value: "abc".to_string(),
            })
        );
    }

    #[test]
    fn unknown_document_type_fails() {
        let result = aggregate("delivery-note", &[], "");

        assert_eq!(
            result,
            Err(DocumentError::UnknownDocumentType("delivery-note".to_string()))
        );
    }

    // =========================================================================
    // Properties
    // =========================================================================

    #[test]
    fn empty_items_give_zero_totals_and_no_bucket_entries() {
        let result = aggregate("invoice", &[], "").unwrap();

        assert!(result.rows.is_empty());
        assert_eq!(result.total_excluding_tax, Decimal::ZERO);
        assert_eq!(result.total_tax, Decimal::ZERO);
        assert_eq!(result.total_including_tax, Decimal::ZERO);
        assert_eq!(result.buckets, BucketTotals::default());
        assert_eq!(result.buckets.entries().count(), 0);
    }

    #[test]
    fn row_subtotals_sum_to_total_excluding_tax() {
        let items = vec![
            item("3", "333.33", "0.99", "10"),
            item("0.5", "1999.99", "", "8"),
            item("7", "12.34", "5", ""),
            item("1", "0.01", "", "0"),
        ];

        let result = aggregate("estimate", &items, "").unwrap();
        let row_sum: Decimal = result.rows.iter().map(|r| r.subtotal).sum();

        assert_eq!(row_sum, result.total_excluding_tax);
        assert_eq!(result.buckets.subtotal_sum(), result.total_excluding_tax);
    }

    #[test]
    fn nominal_rates_keep_both_tax_figures_equal() {
        let items = vec![
            item("2", "150", "", "10"),
            item("4", "75", "", "8"),
            item("1", "40", "", "0"),
        ];

        let result = aggregate("invoice", &items, "").unwrap();

        assert_eq!(result.bucket_tax_total(), result.total_tax);
        assert_eq!(result.tax_divergence(), Decimal::ZERO);
    }

    #[test]
    fn calculate_is_idempotent() {
        let items = LineItemInput::parse_all(&[
            item("2", "1000", "100", "10"),
            item("1", "480", "", "8"),
        ])
        .unwrap();
        let aggregator = Aggregator::new(DocumentType::Estimate);

        let first = aggregator.calculate(&items, "note").unwrap();
        let second = aggregator.calculate(&items, "note").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn discount_is_removed_before_tax() {
        let result = aggregate("invoice", &[item("2", "1000", "500", "10")], "").unwrap();

        assert_eq!(result.rows[0].subtotal, dec!(1500));
        assert_eq!(result.rows[0].tax, dec!(150));
    }

    #[test]
    fn entries_lists_only_buckets_with_rows_in_print_order() {
        let items = vec![item("1", "100", "", ""), item("1", "100", "", "10")];

        let result = aggregate("estimate", &items, "").unwrap();
        let buckets: Vec<TaxBucket> = result.buckets.entries().map(|(b, _)| b).collect();

        assert_eq!(buckets, vec![TaxBucket::Standard, TaxBucket::Exempt]);
    }

    #[test]
    fn remarks_are_trimmed_and_blank_remarks_dropped() {
        let with = aggregate("estimate", &[], "  Payment within 30 days\n").unwrap();
        let without = aggregate("estimate", &[], " \n ").unwrap();

        assert_eq!(with.remarks.as_deref(), Some("Payment within 30 days"));
        assert_eq!(without.remarks, None);
    }

    // =========================================================================
    // Overflow
    // =========================================================================

    #[test]
    fn row_product_overflow_is_an_error() {
        let items = vec![item("79228162514264337593543950335", "2", "", "10")];

        let result = aggregate("estimate", &items, "");

        assert_eq!(result, Err(DocumentError::AmountOutOfRange { row: 1 }));
    }

    #[test]
    fn running_total_overflow_names_the_row_that_overflowed() {
        let huge = "50000000000000000000000000000";
        let items = vec![
            item("1", "1", "", ""),
            item(huge, "1", "", ""),
            item(huge, "1", "", ""),
        ];

        let result = aggregate("invoice", &items, "");

        assert_eq!(result, Err(DocumentError::AmountOutOfRange { row: 3 }));
    }

    #[test]
    fn including_tax_overflow_is_an_error() {
        let items = vec![item("75000000000000000000000000000", "1", "", "10")];

        let result = aggregate("receipt", &items, "");

        assert_eq!(result, Err(DocumentError::AmountOutOfRange { row: 1 }));
    }

    // =========================================================================
    // Off-nominal rates
    // =========================================================================

    #[test]
    fn off_nominal_rate_counts_in_total_tax_but_not_bucket_tax() {
        let _guard = init_test_tracing();
        let items = vec![item("1", "1000", "", "10"), item("1", "1000", "", "5")];

        let result = aggregate("invoice", &items, "").unwrap();

        assert_eq!(result.total_tax, dec!(150));
        assert_eq!(result.buckets.exempt, bucket(dec!(1000), dec!(0), 1));
        assert_eq!(result.bucket_tax_total(), dec!(100));
        assert_eq!(result.tax_divergence(), dec!(50));
    }

    #[test]
    fn for_rate_matches_nominal_rates_regardless_of_scale() {
        assert_eq!(TaxBucket::for_rate(dec!(0.1)), TaxBucket::Standard);
        assert_eq!(TaxBucket::for_rate(dec!(0.100)), TaxBucket::Standard);
        assert_eq!(TaxBucket::for_rate(dec!(0.08)), TaxBucket::Reduced);
        assert_eq!(TaxBucket::for_rate(dec!(0)), TaxBucket::Exempt);
        assert_eq!(TaxBucket::for_rate(dec!(0.05)), TaxBucket::Exempt);
    }

    // =========================================================================
    // Properties over generated items
    // =========================================================================

    mod properties {
        use proptest::prelude::*;

        use super::*;

        /// Items with amounts far below the `Decimal` range.
        fn items_with_rates(
            rates: &'static [&'static str]
        ) -> impl Strategy<Value = Vec<LineItemInput>> {
            let row = (
                0i64..100_000,
                0i64..1_000_000_000,
                0i64..1_000_000,
                prop::sample::select(rates),
            )
                .prop_map(|(quantity, price, discount, rate)| {
                    item(
                        &Decimal::new(quantity, 2).to_string(),
                        &Decimal::new(price, 2).to_string(),
                        &Decimal::new(discount, 2).to_string(),
                        rate,
                    )
                });
            prop::collection::vec(row, 0..12)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            #[test]
            fn row_subtotals_always_sum_to_total_excluding_tax(
                items in items_with_rates(&["10", "8", "0", "", "5", "12.5"])
            ) {
                let result = aggregate("estimate", &items, "").unwrap();
                let row_sum: Decimal = result.rows.iter().map(|r| r.subtotal).sum();

                prop_assert_eq!(row_sum, result.total_excluding_tax);
                prop_assert_eq!(
                    result.total_including_tax,
                    result.total_excluding_tax + result.total_tax
                );
            }

            #[test]
            fn bucket_subtotals_sum_to_total_for_nominal_rates(
                items in items_with_rates(&["10", "8", "0", ""])
            ) {
                let result = aggregate("invoice", &items, "").unwrap();

                prop_assert_eq!(result.buckets.subtotal_sum(), result.total_excluding_tax);
                prop_assert_eq!(result.bucket_tax_total(), result.total_tax);
                prop_assert_eq!(result.tax_divergence(), Decimal::ZERO);
            }

            #[test]
            fn aggregate_is_idempotent(
                items in items_with_rates(&["10", "8", "0", "", "3"]),
                remarks in "[ A-Za-z0-9]{0,20}"
            ) {
                let first = aggregate("receipt", &items, &remarks).unwrap();
                let second = aggregate("receipt", &items, &remarks).unwrap();

                prop_assert_eq!(first, second);
            }
        }
    }
}
