use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DocumentType, LineItemInput};

/// Everything needed to fill one document, apart from the company profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// The customer the document is addressed to.
    pub client_name: String,
    pub details: DocumentDetails,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub remarks: String,
}

/// Header fields that differ between document types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "document_type", rename_all = "lowercase")]
pub enum DocumentDetails {
    Estimate(TradeTerms),
    Invoice(TradeTerms),
    Receipt(ReceiptTerms),
}

/// Header of estimates and invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTerms {
    #[serde(default)]
    pub subject: String,
    pub expiry_date: NaiveDate,
    /// Free text; may be a date or something like "upon agreement".
    #[serde(default)]
    pub delivery_date: String,
    #[serde(default)]
    pub delivery_place: String,
    #[serde(default)]
    pub transaction_method: String,
}

/// Header of receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptTerms {
    /// End of the statutory retention period.
    pub retention_until: NaiveDate,
    #[serde(default)]
    pub delivery_place: String,
    #[serde(default)]
    pub transaction_method: String,
}

impl DocumentDetails {
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Estimate(_) => DocumentType::Estimate,
            Self::Invoice(_) => DocumentType::Invoice,
            Self::Receipt(_) => DocumentType::Receipt,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Estimate(terms) | Self::Invoice(terms) => {
                Some(terms.subject.as_str()).filter(|s| !s.trim().is_empty())
            }
            Self::Receipt(_) => None,
        }
    }
}

impl DocumentRequest {
    pub fn document_type(&self) -> DocumentType {
        self.details.document_type()
    }

    /// Remarks with surrounding whitespace removed, or `None` when blank.
    pub fn remarks(&self) -> Option<&str> {
        Some(self.remarks.trim()).filter(|r| !r.is_empty())
    }
}
