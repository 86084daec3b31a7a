//! Writes a composed document into a fresh xlsx workbook.
//!
//! Used when no template is configured for the document type (see
//! [`TemplateRenderer`](crate::template::TemplateRenderer)). The workbook
//! holds one worksheet named after the document's label, with every cell of
//! the [`CellMap`](billing_core::cells::CellMap) written at its address.
//! Whole amounts are shown with thousands separators and rates as
//! percentages.

use std::path::{Path, PathBuf};

use billing_core::ComposedDocument;
use billing_core::cells::{CellRef, CellValue};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{DocProperties, Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("value {value} in {cell} cannot be written as a number")]
    NumberOutOfRange { cell: String, value: Decimal },

    #[error("template '{}': {message}", path.display())]
    Template { path: PathBuf, message: String },
}

pub struct XlsxRenderer {
    amount_format: Format,
    percent_format: Format,
}

impl Default for XlsxRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxRenderer {
    pub fn new() -> Self {
        Self {
            amount_format: Format::new().set_num_format("#,##0"),
            percent_format: Format::new().set_num_format("0%"),
        }
    }

    /// Builds the workbook in memory.
    pub fn render(
        &self,
        document: &ComposedDocument,
    ) -> Result<Workbook, RenderError> {
        let mut workbook = Workbook::new();

        let mut properties = DocProperties::new().set_title(document.document_type.label());
        if let Some(subject) = &document.subject {
            properties = properties.set_subject(subject);
        }
        workbook.set_properties(&properties);

        let sheet = workbook.add_worksheet();
        sheet.set_name(document.document_type.label())?;
        sheet.set_column_width(0, 32)?;

        for (cell, value) in document.cells.iter() {
            self.write_cell(sheet, *cell, value)?;
        }

        debug!(
            document_type = %document.document_type,
            cells = document.cells.len(),
            "Rendered worksheet"
        );
        Ok(workbook)
    }

    /// Renders and saves to `path`, overwriting any existing file.
    pub fn render_to_path(
        &self,
        document: &ComposedDocument,
        path: &Path,
    ) -> Result<(), RenderError> {
        let mut workbook = self.render(document)?;
        workbook.save(path)?;
        Ok(())
    }

    /// Renders to the bytes of an xlsx file.
    pub fn render_to_buffer(
        &self,
        document: &ComposedDocument,
    ) -> Result<Vec<u8>, RenderError> {
        let mut workbook = self.render(document)?;
        Ok(workbook.save_to_buffer()?)
    }

    fn write_cell(
        &self,
        sheet: &mut Worksheet,
        cell: CellRef,
        value: &CellValue,
    ) -> Result<(), RenderError> {
        let (row, col) = (cell.row_index(), cell.column());
        match value {
            CellValue::Text(text) => {
                sheet.write_string(row, col, text)?;
            }
            CellValue::Number(n) if n.fract().is_zero() => {
                sheet.write_number_with_format(row, col, to_f64(cell, *n)?, &self.amount_format)?;
            }
            CellValue::Number(n) => {
                sheet.write_number(row, col, to_f64(cell, *n)?)?;
            }
            CellValue::Percent(rate) => {
                sheet.write_number_with_format(row, col, to_f64(cell, *rate)?, &self.percent_format)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn to_f64(
    cell: CellRef,
    value: Decimal,
) -> Result<f64, RenderError> {
    value.to_f64().ok_or(RenderError::NumberOutOfRange {
        cell: cell.to_string(),
        value,
    })
}
