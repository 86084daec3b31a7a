use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Estimate,
    Invoice,
    Receipt,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [Self::Estimate, Self::Invoice, Self::Receipt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Estimate => "estimate",
            Self::Invoice => "invoice",
            Self::Receipt => "receipt",
        }
    }

    /// Title printed on the sheet and used as the worksheet name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Estimate => "見積書",
            Self::Invoice => "請求書",
            Self::Receipt => "領収書",
        }
    }

    /// Accepts the lowercase code (any case) or the Japanese label.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.label() == s)
    }

    /// Whether the company's bank account is printed on the sheet.
    pub fn shows_bank_account(&self) -> bool {
        matches!(self, Self::Invoice)
    }
}

impl FromStr for DocumentType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DocumentError::UnknownDocumentType(s.to_string()))
    }
}

impl fmt::Display for DocumentType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
