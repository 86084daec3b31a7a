//! Document requests written as TOML.
//!
//! ```toml
//! document_type = "invoice"        # estimate | invoice | receipt (or its label)
//! client_name = "Kaede Foods Ltd."
//! subject = "Website renewal"      # estimate / invoice
//! expiry_date = "2026-11-30"       # estimate / invoice
//! delivery_date = "Upon agreement" # estimate / invoice, free text
//! retention_until = "2033-10-18"   # receipt
//! delivery_place = "Head office"
//! transaction_method = "Bank transfer"
//! remarks = "Payment due within 30 days."
//!
//! [[items]]
//! description = "Web design"
//! quantity = 1
//! unit = "set"
//! unit_price = 150000
//! discount = 10000
//! tax_rate = 10
//! ```
//!
//! Dates are quoted strings in `YYYY-MM-DD` or `YYYY/MM/DD` form. Item fields
//! may be numbers or strings; either way they are handed to the aggregator
//! as text.

use std::fs;
use std::path::{Path, PathBuf};

use billing_core::{
    DocumentDetails, DocumentError, DocumentRequest, DocumentType, LineItemInput, ReceiptTerms,
    TradeTerms,
};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestFileError {
    #[error("cannot read request file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid request file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("'{0}' is required for this document type")]
    MissingField(&'static str),

    #[error("'{field}' is not a date: '{value}'")]
    InvalidDate { field: &'static str, value: String },
}

/// An item cell as typed: a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Cell {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    fn into_text(self) -> String {
        match self {
            Cell::Integer(n) => n.to_string(),
            Cell::Float(n) => n.to_string(),
            Cell::Text(s) => s,
        }
    }
}

fn text(cell: Option<Cell>) -> String {
    cell.map(Cell::into_text).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct ItemEntry {
    description: Option<Cell>,
    quantity: Option<Cell>,
    unit: Option<Cell>,
    unit_price: Option<Cell>,
    discount: Option<Cell>,
    tax_rate: Option<Cell>,
}

impl From<ItemEntry> for LineItemInput {
    fn from(entry: ItemEntry) -> Self {
        LineItemInput {
            description: text(entry.description),
            quantity: text(entry.quantity),
            unit: text(entry.unit),
            unit_price: text(entry.unit_price),
            discount: text(entry.discount),
            tax_rate: text(entry.tax_rate),
        }
    }
}

/// The on-disk shape of a request. Fields that do not apply to the chosen
/// document type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestFile {
    pub document_type: String,
    pub client_name: String,
    pub subject: String,
    pub expiry_date: Option<String>,
    pub delivery_date: String,
    pub retention_until: Option<String>,
    pub delivery_place: String,
    pub transaction_method: String,
    pub remarks: String,
    items: Vec<ItemEntry>,
}

fn parse_date(
    field: &'static str,
    value: Option<&str>,
) -> Result<NaiveDate, RequestFileError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(RequestFileError::MissingField(field))?;

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .map_err(|_| RequestFileError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

impl RequestFile {
    pub fn from_toml_str(input: &str) -> Result<Self, RequestFileError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, RequestFileError> {
        let text = fs::read_to_string(path).map_err(|source| RequestFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Builds the request, validating the fields the document type needs.
    pub fn into_request(self) -> Result<DocumentRequest, RequestFileError> {
        let details = match self.document_type.parse::<DocumentType>()? {
            document_type @ (DocumentType::Estimate | DocumentType::Invoice) => {
                let terms = TradeTerms {
                    subject: self.subject,
                    expiry_date: parse_date("expiry_date", self.expiry_date.as_deref())?,
                    delivery_date: self.delivery_date,
                    delivery_place: self.delivery_place,
                    transaction_method: self.transaction_method,
                };
                if document_type == DocumentType::Estimate {
                    DocumentDetails::Estimate(terms)
                } else {
                    DocumentDetails::Invoice(terms)
                }
            }
            DocumentType::Receipt => DocumentDetails::Receipt(ReceiptTerms {
                retention_until: parse_date("retention_until", self.retention_until.as_deref())?,
                delivery_place: self.delivery_place,
                transaction_method: self.transaction_method,
            }),
        };

        Ok(DocumentRequest {
            client_name: self.client_name,
            details,
            items: self.items.into_iter().map(LineItemInput::from).collect(),
            remarks: self.remarks,
        })
    }
}
