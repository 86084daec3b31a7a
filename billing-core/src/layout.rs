//! Row positions of the variable parts of each document layout.
//!
//! The invoice layout carries the bank account block in the sender area,
//! which pushes everything below it down by one row.
//!
//! | Type     | Items from | Totals | Tax buckets | Remarks |
//! |----------|------------|--------|-------------|---------|
//! | estimate | 16         | 26     | 28          | 33      |
//! | invoice  | 17         | 27     | 29          | 34      |
//! | receipt  | 16         | 26     | 28          | 33      |

use serde::{Deserialize, Serialize};

use crate::models::DocumentType;

/// Row numbers (1-based, as shown in a spreadsheet) for one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Row of the first line item.
    pub item_origin_row: u32,
    /// Row of the tax-excluded total; tax and tax-included follow below.
    pub totals_row: u32,
    /// Row of the 10% bucket; the 8% and 0% buckets follow below.
    pub bucket_row: u32,
    pub remarks_row: u32,
}

const BASE_LAYOUT: DocumentLayout = DocumentLayout {
    item_origin_row: 16,
    totals_row: 26,
    bucket_row: 28,
    remarks_row: 33,
};

impl DocumentLayout {
    /// Built-in layout of `document_type`.
    pub fn for_document(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::Invoice => BASE_LAYOUT.shifted(1),
            DocumentType::Estimate | DocumentType::Receipt => BASE_LAYOUT,
        }
    }

    fn shifted(
        self,
        rows: u32,
    ) -> Self {
        Self {
            item_origin_row: self.item_origin_row.saturating_add(rows),
            totals_row: self.totals_row.saturating_add(rows),
            bucket_row: self.bucket_row.saturating_add(rows),
            remarks_row: self.remarks_row.saturating_add(rows),
        }
    }

    /// Number of line items that fit above the totals block.
    pub fn item_capacity(&self) -> usize {
        self.totals_row.saturating_sub(self.item_origin_row) as usize
    }

    /// Sheet row of the line item at zero-based `index`.
    pub fn item_row(
        &self,
        index: usize,
    ) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.item_origin_row.saturating_add(index)
    }
}

/// One layout per document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTable {
    estimate: DocumentLayout,
    invoice: DocumentLayout,
    receipt: DocumentLayout,
}

impl LayoutTable {
    pub fn get(
        &self,
        document_type: DocumentType,
    ) -> DocumentLayout {
        match document_type {
            DocumentType::Estimate => self.estimate,
            DocumentType::Invoice => self.invoice,
            DocumentType::Receipt => self.receipt,
        }
    }

    /// Replaces the layout of one document type.
    pub fn set(
        &mut self,
        document_type: DocumentType,
        layout: DocumentLayout,
    ) {
        let slot = match document_type {
            DocumentType::Estimate => &mut self.estimate,
            DocumentType::Invoice => &mut self.invoice,
            DocumentType::Receipt => &mut self.receipt,
        };
        *slot = layout;
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self {
            estimate: DocumentLayout::for_document(DocumentType::Estimate),
            invoice: DocumentLayout::for_document(DocumentType::Invoice),
            receipt: DocumentLayout::for_document(DocumentType::Receipt),
        }
    }
}
