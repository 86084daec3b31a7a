//! CSV loader for document line items.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does **not** matter. Cells
//! are trimmed. `quantity` and `unit_price` must hold a number; a blank or
//! missing `discount` or `tax_rate` counts as zero.
//!
//! | Column       | Notes                                      |
//! |--------------|--------------------------------------------|
//! | `description`| Free text                                  |
//! | `quantity`   | decimal, required                          |
//! | `unit`       | Free text, e.g. `pcs`                      |
//! | `unit_price` | decimal, required, no thousands separators |
//! | `discount`   | decimal amount subtracted from the row     |
//! | `tax_rate`   | percentage: `10`, `8` or blank for exempt  |
//!
//! ```csv
//! description,quantity,unit,unit_price,discount,tax_rate
//! Web design,1,set,150000,10000,10
//! Catering lunch,20,box,1080,,8
//! ```
//!
//! Cells are kept as text. Whether they are valid numbers is decided when
//! the items are aggregated, which reports the offending row and field.
use std::io::Read;

use billing_core::LineItemInput;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineItemLoaderError {
    /// The CSV is structurally invalid (ragged rows, bad quoting, etc.).
    /// `row` is 1-based, not counting the header.
    #[error("CSV parse error on row {row}: {message}")]
    CsvParse { row: usize, message: String },
}

pub struct LineItemLoader;

impl LineItemLoader {
    /// Parse line items from any reader, in file order.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<LineItemInput>, LineItemLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        csv_reader
            .deserialize::<LineItemInput>()
            .enumerate()
            .map(|(idx, result)| {
                result.map_err(|e| LineItemLoaderError::CsvParse {
                    row: idx + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Convenience wrapper over [`parse`](Self::parse) for in-memory text.
    pub fn load_from_str(input: &str) -> Result<Vec<LineItemInput>, LineItemLoaderError> {
        Self::parse(input.as_bytes())
    }
}
