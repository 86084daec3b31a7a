//! Spreadsheet coordinates and the values written to them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A cell address such as `G11`.
///
/// Ordered row first, so iterating a [`CellMap`] walks the sheet top to
/// bottom, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// 1-based, as displayed.
    row: u32,
    /// 0-based (`A` = 0).
    column: u16,
}

impl CellRef {
    /// `column` is a single letter, `row` is 1-based.
    pub fn new(
        column: char,
        row: u32,
    ) -> Self {
        debug_assert!(
            column.is_ascii_alphabetic(),
            "column letter expected, got {column:?}"
        );
        let column = u16::from(column.to_ascii_uppercase() as u8 - b'A');
        Self { row, column }
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u16 {
        self.column
    }

    /// 0-based row index, as used by spreadsheet writers.
    pub fn row_index(&self) -> u32 {
        self.row.saturating_sub(1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = u32::from(self.column) + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(char::from(b'A' + rem as u8));
            n = (n - 1) / 26;
        }
        for letter in letters.iter().rev() {
            write!(f, "{letter}")?;
        }
        write!(f, "{}", self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCellRefError(String);

impl fmt::Display for ParseCellRefError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "invalid cell reference '{}'", self.0)
    }
}

impl std::error::Error for ParseCellRefError {}

impl FromStr for CellRef {
    type Err = ParseCellRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCellRefError(s.to_string());

        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(err)?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty()
            || letters.len() > 3
            || !letters.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(err());
        }

        let mut column: u32 = 0;
        for c in letters.chars() {
            column = column * 26 + u32::from(c.to_ascii_uppercase() as u8 - b'A' + 1);
        }
        let column = u16::try_from(column - 1).map_err(|_| err())?;

        let row: u32 = digits.parse().map_err(|_| err())?;
        if row == 0 {
            return Err(err());
        }

        Ok(Self { row, column })
    }
}

/// A value destined for one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    /// Quantity or money amount.
    Number(Decimal),
    /// Fraction shown as a percentage (`0.10` → `10%`).
    Percent(Decimal),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) | Self::Percent(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

/// Cell values keyed by address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellMap {
    cells: BTreeMap<CellRef, CellValue>,
}

impl CellMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` at `cell`, replacing whatever was there.
    pub fn set(
        &mut self,
        cell: CellRef,
        value: CellValue,
    ) {
        self.cells.insert(cell, value);
    }

    pub fn set_text(
        &mut self,
        cell: CellRef,
        text: impl Into<String>,
    ) {
        self.set(cell, CellValue::Text(text.into()));
    }

    pub fn set_number(
        &mut self,
        cell: CellRef,
        number: Decimal,
    ) {
        self.set(cell, CellValue::Number(number));
    }

    pub fn set_percent(
        &mut self,
        cell: CellRef,
        rate: Decimal,
    ) {
        self.set(cell, CellValue::Percent(rate));
    }

    pub fn get(
        &self,
        cell: CellRef,
    ) -> Option<&CellValue> {
        self.cells.get(&cell)
    }

    /// Looks a cell up by its `A1`-style address.
    pub fn get_at(
        &self,
        address: &str,
    ) -> Option<&CellValue> {
        address.parse().ok().and_then(|cell| self.get(cell))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &CellValue)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn display_formats_a1_addresses() {
        assert_eq!(CellRef::new('A', 2).to_string(), "A2");
        assert_eq!(CellRef::new('g', 11).to_string(), "G11");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "column letter expected")]
    fn new_rejects_non_letter_columns() {
        let _ = CellRef::new('1', 4);
    }

    #[test]
    fn row_index_of_row_zero_does_not_underflow() {
        assert_eq!(CellRef::new('A', 0).row_index(), 0);
        assert_eq!(CellRef::new('A', 1).row_index(), 0);
    }

    #[test]
    fn parse_round_trips_display() {
        for address in ["A1", "I26", "AA3", "AZ100"] {
            let cell: CellRef = address.parse().unwrap();
            assert_eq!(cell.to_string(), address);
        }
    }

    #[test]
    fn parse_rejects_malformed_addresses() {
        for address in ["", "11", "G", "G0", "1G", "G-1"] {
            assert!(address.parse::<CellRef>().is_err(), "{address} should not parse");
        }
    }

    #[test]
    fn indices_are_zero_based() {
        let cell = CellRef::new('C', 29);

        assert_eq!(cell.column(), 2);
        assert_eq!(cell.row_index(), 28);
    }

    #[test]
    fn iteration_walks_rows_top_to_bottom() {
        let mut cells = CellMap::new();
        cells.set_number(CellRef::new('I', 26), dec!(1));
        cells.set_text(CellRef::new('B', 5), "b5");
        cells.set_text(CellRef::new('A', 5), "a5");

        let order: Vec<String> = cells.iter().map(|(c, _)| c.to_string()).collect();

        assert_eq!(order, vec!["A5", "B5", "I26"]);
    }

    #[test]
    fn set_replaces_existing_value() {
        let mut cells = CellMap::new();
        cells.set_text(CellRef::new('A', 1), "first");
        cells.set_percent(CellRef::new('A', 1), dec!(0.08));

        assert_eq!(cells.len(), 1);
        assert_eq!(cells.get_at("A1"), Some(&CellValue::Percent(dec!(0.08))));
    }
}
