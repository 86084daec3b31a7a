use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use billing_core::db::{ProfileRepository, RepositoryRegistry};
use billing_core::{
    AggregationResult, CompanyProfile, DocumentRequest, DocumentType, LayoutTable, LineItemInput,
    aggregate, compose,
};
use billing_data::LineItemLoader;
use billing_db_sqlite::SqliteRepositoryFactory;
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::render::XlsxRenderer;
use crate::request_file::RequestFile;
use crate::template::TemplateRenderer;

/// Registry with every storage backend compiled into this binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Reads line items from a CSV file.
pub fn load_items(path: &Path) -> Result<Vec<LineItemInput>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    LineItemLoader::parse(file).with_context(|| format!("Failed to parse CSV: {}", path.display()))
}

/// Reads a request file; items from `items_csv`, when given, replace any
/// items listed in the request itself.
pub fn load_request(
    request_path: &Path,
    items_csv: Option<&Path>,
) -> Result<DocumentRequest> {
    let file = RequestFile::load(request_path)?;
    let inline_items = file.has_items();
    let mut request = file
        .into_request()
        .with_context(|| format!("Invalid request: {}", request_path.display()))?;

    if let Some(path) = items_csv {
        if inline_items {
            warn!(
                request = %request_path.display(),
                items = %path.display(),
                "Request lists its own items; using the CSV items instead"
            );
        }
        request.items = load_items(path)?;
    }
    Ok(request)
}

/// `<output_dir>/<label>_<yyyyMMddHHmm>.xlsx`
pub fn default_output_path(
    output_dir: &Path,
    document_type: DocumentType,
    now: NaiveDateTime,
) -> PathBuf {
    output_dir.join(format!(
        "{}_{}.xlsx",
        document_type.label(),
        now.format("%Y%m%d%H%M")
    ))
}

/// A document written to disk.
#[derive(Debug)]
pub struct GeneratedDocument {
    pub path: PathBuf,
    pub totals: AggregationResult,
}

/// Fills and saves one document.
///
/// The values go into a copy of `template` when one is given, otherwise into
/// a blank workbook. The profile is read first; when none is on record the
/// returned error downcasts to
/// [`billing_core::DocumentError::ProfileUnavailable`] and nothing is
/// written.
pub async fn generate(
    repo: &dyn ProfileRepository,
    layouts: &LayoutTable,
    template: Option<&Path>,
    request: &DocumentRequest,
    output: &Path,
    now: NaiveDateTime,
) -> Result<GeneratedDocument> {
    let profile = repo.require_profile().await?;
    let document = compose(request, &profile, layouts, now.date())?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let written = match template {
        Some(template) => TemplateRenderer::new(template).render_to_path(&document, output),
        None => XlsxRenderer::new().render_to_path(&document, output),
    };
    written.with_context(|| format!("Failed to write: {}", output.display()))?;

    info!(
        document_type = %document.document_type,
        path = %output.display(),
        total = %document.totals.total_including_tax,
        "Generated document"
    );

    Ok(GeneratedDocument {
        path: output.to_path_buf(),
        totals: document.totals,
    })
}

/// Totals for a CSV of line items, without rendering anything.
pub fn aggregate_file(
    document_type: &str,
    items_csv: &Path,
    remarks: &str,
) -> Result<AggregationResult> {
    let items = load_items(items_csv)?;
    Ok(aggregate(document_type, &items, remarks)?)
}

/// Human-readable totals, one figure per line.
pub fn format_totals(result: &AggregationResult) -> String {
    let mut lines = vec![
        format!("{} ({})", result.document_type.label(), result.document_type),
        format!("  Subtotal (excl. tax): {}", result.total_excluding_tax.normalize()),
        format!("  Tax:                  {}", result.total_tax.normalize()),
        format!("  Total (incl. tax):    {}", result.total_including_tax.normalize()),
    ];

    lines.extend(result.buckets.entries().map(|(bucket, total)| {
        format!(
            "  {:>3} bucket: subtotal {}, tax {} ({} rows)",
            bucket.label(),
            total.subtotal.normalize(),
            total.tax.normalize(),
            total.rows
        )
    }));

    let divergence = result.tax_divergence();
    if !divergence.is_zero() {
        lines.push(format!(
            "  Note: row tax differs from bucket tax by {} (rates other than 10%/8%/0%)",
            divergence.normalize()
        ));
    }
    if let Some(remarks) = &result.remarks {
        lines.push(format!("  Remarks: {remarks}"));
    }
    lines.join("\n") + "\n"
}

pub fn format_profile(profile: &CompanyProfile) -> String {
    let bank = match &profile.bank_account {
        Some(bank) => format!(
            "{} {} {} ({})",
            bank.bank_branch, bank.account_type, bank.account_number, bank.account_name
        ),
        None => "(none)".to_string(),
    };

    [
        format!("Company:        {}", profile.company_name),
        format!("Postal code:    {}", profile.postal_code),
        format!("Address:        {}", profile.address),
        format!("                {}", profile.address_detail),
        format!("Phone:          {}", profile.phone_number),
        format!("Contact:        {}", profile.contact_person),
        format!("Bank account:   {bank}"),
    ]
    .join("\n")
        + "\n"
}
