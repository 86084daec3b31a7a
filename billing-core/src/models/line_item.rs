use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{parse_field, parse_field_or_zero, percent_to_rate};
use crate::error::DocumentError;

/// One line item as it was typed in: every field is raw text.
///
/// Quantity and unit price are required; a blank discount or tax rate
/// counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub unit_price: String,
    #[serde(default)]
    pub discount: String,
    /// Percentage, e.g. `"10"` for 10%.
    #[serde(default)]
    pub tax_rate: String,
}

/// A parsed line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub discount: Decimal,
    /// Fraction, e.g. `0.10` for 10%.
    pub tax_rate: Decimal,
}

impl LineItemInput {
    /// Parses the numeric fields.
    ///
    /// `row` is the 1-based position of the item and is only used to point
    /// at the offending line in [`DocumentError::InvalidLineItem`].
    pub fn parse(
        &self,
        row: usize,
    ) -> Result<LineItem, DocumentError> {
        Ok(LineItem {
            description: self.description.clone(),
            quantity: parse_field(row, "quantity", &self.quantity)?,
            unit: self.unit.clone(),
            unit_price: parse_field(row, "unit price", &self.unit_price)?,
            discount: parse_field_or_zero(row, "discount", &self.discount)?,
            tax_rate: percent_to_rate(parse_field_or_zero(row, "tax rate", &self.tax_rate)?),
        })
    }

    /// Parses every item, stopping at the first invalid one.
    pub fn parse_all(items: &[LineItemInput]) -> Result<Vec<LineItem>, DocumentError> {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| item.parse(idx + 1))
            .collect()
    }
}

impl LineItem {
    /// Quantity × unit price − discount, `None` if it overflows.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.quantity
            .checked_mul(self.unit_price)?
            .checked_sub(self.discount)
    }

    /// Tax on this row alone, `None` if it overflows.
    pub fn tax(&self) -> Option<Decimal> {
        self.subtotal()?.checked_mul(self.tax_rate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn input(
        quantity: &str,
        unit_price: &str,
        discount: &str,
        tax_rate: &str,
    ) -> LineItemInput {
        LineItemInput {
            description: "Consulting".to_string(),
            quantity: quantity.to_string(),
            unit: "h".to_string(),
            unit_price: unit_price.to_string(),
            discount: discount.to_string(),
            tax_rate: tax_rate.to_string(),
        }
    }

    #[test]
    fn parse_converts_percentage_to_fraction() {
        let item = input("2", "1000", "0", "10").parse(1).unwrap();

        assert_eq!(item.quantity, dec!(2));
        assert_eq!(item.unit_price, dec!(1000));
        assert_eq!(item.tax_rate, dec!(0.10));
    }

    #[test]
    fn parse_treats_blank_discount_and_tax_rate_as_zero() {
        let item = input("3", "500", "", " ").parse(1).unwrap();

        assert_eq!(item.discount, Decimal::ZERO);
        assert_eq!(item.tax_rate, Decimal::ZERO);
    }

    #[test]
    fn parse_rejects_blank_quantity() {
        let result = input("", "500", "", "10").parse(2);

        assert_eq!(
            result,
            Err(DocumentError::InvalidLineItem {
                row: 2,
                field: "quantity",
                value: String::new(),
            })
        );
    }

    #[test]
    fn parse_rejects_blank_unit_price() {
        let result = input("3", " ", "", "10").parse(1);

        assert!(matches!(
            result,
            Err(DocumentError::InvalidLineItem { row: 1, field: "unit price", .. })
        ));
    }

    #[test]
    fn parse_rejects_non_numeric_quantity() {
        let result = input("abc", "1000", "0", "10").parse(4);

        assert_eq!(
            result,
            Err(DocumentError::InvalidLineItem {
                row: 4,
                field: "quantity",
                value: "abc".to_string(),
            })
        );
    }

    #[test]
    fn parse_rejects_non_numeric_discount() {
        let result = input("1", "1000", "ten", "10").parse(1);

        assert!(matches!(
            result,
            Err(DocumentError::InvalidLineItem { field: "discount", .. })
        ));
    }

    #[test]
    fn parse_all_reports_first_bad_row() {
        let items = vec![input("1", "100", "", "10"), input("1", "x", "", "10")];

        let result = LineItemInput::parse_all(&items);

        assert!(matches!(
            result,
            Err(DocumentError::InvalidLineItem { row: 2, field: "unit price", .. })
        ));
    }

    #[test]
    fn subtotal_subtracts_discount_before_tax() {
        let item = input("4", "250", "100", "8").parse(1).unwrap();

        assert_eq!(item.subtotal(), Some(dec!(900)));
        assert_eq!(item.tax(), Some(dec!(72)));
    }

    #[test]
    fn subtotal_is_none_when_the_product_overflows() {
        let item = input("79228162514264337593543950335", "2", "", "10")
            .parse(1)
            .unwrap();

        assert_eq!(item.subtotal(), None);
        assert_eq!(item.tax(), None);
    }
}
