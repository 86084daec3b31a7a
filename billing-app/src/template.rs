//! Fills a per-type template workbook instead of a blank one.
//!
//! The first worksheet of the template receives every cell of the composed
//! document; labels, borders and number formats already in the template stay
//! as they are. The template file itself is only read, the filled copy goes
//! to the output path.

use std::path::{Path, PathBuf};

use billing_core::ComposedDocument;
use billing_core::cells::CellValue;
use tracing::debug;
use umya_spreadsheet::{Spreadsheet, reader, writer};

use crate::render::{RenderError, to_f64};

pub struct TemplateRenderer {
    template: PathBuf,
}

impl TemplateRenderer {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Reads the template and writes the document's cells into it.
    pub fn render(
        &self,
        document: &ComposedDocument,
    ) -> Result<Spreadsheet, RenderError> {
        let mut book = reader::xlsx::read(&self.template).map_err(|e| RenderError::Template {
            path: self.template.clone(),
            message: e.to_string(),
        })?;

        let sheet = book.get_sheet_mut(&0).ok_or_else(|| RenderError::Template {
            path: self.template.clone(),
            message: "workbook has no worksheet".to_string(),
        })?;

        for (cell, value) in document.cells.iter() {
            let target = sheet.get_cell_mut((u32::from(cell.column()) + 1, cell.row()));
            match value {
                CellValue::Text(text) => {
                    target.set_value_string(text.as_str());
                }
                CellValue::Number(n) | CellValue::Percent(n) => {
                    target.set_value_number(to_f64(*cell, *n)?);
                }
            }
        }

        debug!(
            document_type = %document.document_type,
            template = %self.template.display(),
            cells = document.cells.len(),
            "Filled template"
        );
        Ok(book)
    }

    /// Fills the template and saves the result to `path`.
    pub fn render_to_path(
        &self,
        document: &ComposedDocument,
        path: &Path,
    ) -> Result<(), RenderError> {
        let book = self.render(document)?;
        writer::xlsx::write(&book, path).map_err(|e| RenderError::Template {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use billing_core::cells::{CellMap, CellRef};
    use billing_core::{Aggregator, DocumentType};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use rust_xlsxwriter::Workbook;

    use super::*;

    /// Writes a small estimate template with a title and a totals label.
    fn write_template(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("見積書").unwrap();
        sheet.write_string(0, 0, "御見積書").unwrap();
        sheet.write_string(25, 7, "小計").unwrap();
        workbook.save(path).unwrap();
    }

    fn document() -> ComposedDocument {
        let mut cells = CellMap::new();
        cells.set_text(CellRef::new('A', 2), "Kaede Foods");
        cells.set_number(CellRef::new('I', 26), dec!(1500));
        cells.set_percent(CellRef::new('H', 16), dec!(0.10));

        ComposedDocument {
            document_type: DocumentType::Estimate,
            subject: None,
            cells,
            totals: Aggregator::new(DocumentType::Estimate)
                .calculate(&[], "")
                .unwrap(),
        }
    }

    #[test]
    fn fills_cells_and_keeps_template_labels() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("estimate_template.xlsx");
        write_template(&template);

        let book = TemplateRenderer::new(&template).render(&document()).unwrap();
        let sheet = book.get_sheet(&0).unwrap();

        assert_eq!(sheet.get_value((1, 1)), "御見積書");
        assert_eq!(sheet.get_value((8, 26)), "小計");
        assert_eq!(sheet.get_value((1, 2)), "Kaede Foods");
        assert_eq!(sheet.get_cell((9, 26)).unwrap().get_value_number(), Some(1500.0));
        assert_eq!(sheet.get_cell((8, 16)).unwrap().get_value_number(), Some(0.1));
    }

    #[test]
    fn render_to_path_leaves_template_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("estimate_template.xlsx");
        write_template(&template);
        let before = std::fs::read(&template).unwrap();
        let output = dir.path().join("estimate.xlsx");

        TemplateRenderer::new(&template)
            .render_to_path(&document(), &output)
            .unwrap();

        assert_eq!(std::fs::read(&template).unwrap(), before);
        let filled = reader::xlsx::read(&output).unwrap();
        assert_eq!(filled.get_sheet(&0).unwrap().get_value((1, 2)), "Kaede Foods");
    }

    #[test]
    fn missing_template_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("missing.xlsx");

        let result = TemplateRenderer::new(&template).render(&document());

        match result {
            Err(RenderError::Template { path, .. }) => assert_eq!(path, template),
            Err(other) => panic!("expected Template error, got {other:?}"),
            Ok(_) => panic!("expected Template error, got a workbook"),
        }
    }
}
