//! Application configuration read from a TOML file.
//!
//! Every key is optional:
//!
//! ```toml
//! output_dir = "documents"
//! log_level = "info"
//! log_file = "billing.log"
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "billing.db"
//!
//! # Workbooks filled per document type; a blank sheet is used otherwise.
//! [templates]
//! estimate = "templates/estimate.xlsx"
//! invoice = "templates/invoice.xlsx"
//!
//! # Only needed when a workbook layout differs from the built-in rows.
//! [layouts.invoice]
//! item_origin_row = 17
//! totals_row = 27
//! bucket_row = 29
//! remarks_row = 34
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use billing_core::db::DbConfig;
use billing_core::{DocumentLayout, DocumentType, LayoutTable};
use serde::Deserialize;
use thiserror::Error;

use crate::logging::DEFAULT_LEVEL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid layout for {document_type}: {reason}")]
    Layout {
        document_type: DocumentType,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "billing.db".to_string(),
        }
    }
}

impl From<&DatabaseConfig> for DbConfig {
    fn from(config: &DatabaseConfig) -> Self {
        DbConfig {
            backend: config.backend.clone(),
            connection_string: config.connection_string.clone(),
        }
    }
}

/// Per-type replacements for the built-in layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayoutOverrides {
    pub estimate: Option<DocumentLayout>,
    pub invoice: Option<DocumentLayout>,
    pub receipt: Option<DocumentLayout>,
}

impl LayoutOverrides {
    fn get(
        &self,
        document_type: DocumentType,
    ) -> Option<DocumentLayout> {
        match document_type {
            DocumentType::Estimate => self.estimate,
            DocumentType::Invoice => self.invoice,
            DocumentType::Receipt => self.receipt,
        }
    }
}

/// Template workbook per document type. Relative paths are resolved from
/// the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplatePaths {
    pub estimate: Option<PathBuf>,
    pub invoice: Option<PathBuf>,
    pub receipt: Option<PathBuf>,
}

impl TemplatePaths {
    pub fn get(
        &self,
        document_type: DocumentType,
    ) -> Option<&Path> {
        match document_type {
            DocumentType::Estimate => self.estimate.as_deref(),
            DocumentType::Invoice => self.invoice.as_deref(),
            DocumentType::Receipt => self.receipt.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    /// Where generated workbooks go when no output path is given.
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub templates: TemplatePaths,
    pub layouts: LayoutOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            output_dir: PathBuf::from("."),
            log_level: DEFAULT_LEVEL.to_string(),
            log_file: None,
            templates: TemplatePaths::default(),
            layouts: LayoutOverrides::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.layout_table()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Built-in layouts with the configured overrides applied.
    ///
    /// An override must keep the blocks in order (items, totals, buckets,
    /// remarks) and leave room for at least one item.
    pub fn layout_table(&self) -> Result<LayoutTable, ConfigError> {
        let mut table = LayoutTable::default();
        for document_type in DocumentType::ALL {
            if let Some(layout) = self.layouts.get(document_type) {
                validate_layout(document_type, &layout)?;
                table.set(document_type, layout);
            }
        }
        Ok(table)
    }
}

/// Last row of an xlsx worksheet.
const MAX_SHEET_ROW: u32 = 1_048_576;

fn validate_layout(
    document_type: DocumentType,
    layout: &DocumentLayout,
) -> Result<(), ConfigError> {
    let reason = if layout.item_origin_row == 0 {
        Some("rows are 1-based")
    } else if layout.totals_row <= layout.item_origin_row {
        Some("totals must come after the first item row")
    } else if layout.bucket_row < layout.totals_row.saturating_add(3) {
        Some("tax buckets overlap the totals block")
    } else if layout.remarks_row < layout.bucket_row.saturating_add(3) {
        Some("remarks overlap the tax bucket block")
    } else if layout.remarks_row > MAX_SHEET_ROW {
        Some("rows run past the end of the worksheet")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::Layout {
            document_type,
            reason,
        }),
        None => Ok(()),
    }
}
