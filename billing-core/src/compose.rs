//! Maps a document request, the company profile and the computed totals
//! onto the fixed cell positions of the document layouts.
//!
//! | Cells | Content |
//! |-------|---------|
//! | `A2` | Client company name |
//! | `F5`, `G6`–`G10` | Company name, postal code, address, address detail, phone, contact person |
//! | `G11`–`G14` | Bank account type, bank/branch, number, holder (invoices only) |
//! | `B5`–`B10` | Estimate/invoice: client, issue date, expiry, delivery date, delivery place, transaction method |
//! | `B5`–`B9` | Receipt: issue date (twice), retention date, delivery place, transaction method |
//! | `A,D–I` from the item row | Description, quantity, unit, unit price, discount, tax rate, subtotal |
//! | `I` at the totals row (+0..+2) | Tax-excluded, tax, tax-included totals |
//! | `B,C` at the bucket row (+0..+2) | Subtotal and tax of the 10%, 8% and 0% buckets |
//! | `A` at the remarks row | Remarks, when given |

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::calculations::{AggregationResult, Aggregator, TaxBucket};
use crate::cells::{CellMap, CellRef};
use crate::error::DocumentError;
use crate::layout::{DocumentLayout, LayoutTable};
use crate::models::{
    CompanyProfile, DocumentDetails, DocumentRequest, DocumentType, LineItem, LineItemInput,
};

const DATE_FORMAT: &str = "%Y/%m/%d";

/// A fully computed document, ready to be handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDocument {
    pub document_type: DocumentType,
    /// Subject line of estimates and invoices; not printed in a cell.
    pub subject: Option<String>,
    pub cells: CellMap,
    pub totals: AggregationResult,
}

/// Builds the cell map for `request`.
///
/// `issued_on` is the issue date printed on the document.
///
/// # Errors
///
/// * [`DocumentError::InvalidLineItem`] — a line item has non-numeric text
///   in a numeric field, or no quantity or unit price.
/// * [`DocumentError::AmountOutOfRange`] — the figures overflow `Decimal`.
/// * [`DocumentError::TooManyLineItems`] — the layout has fewer item rows
///   than there are line items.
pub fn compose(
    request: &DocumentRequest,
    profile: &CompanyProfile,
    layouts: &LayoutTable,
    issued_on: NaiveDate,
) -> Result<ComposedDocument, DocumentError> {
    let document_type = request.document_type();
    let layout = layouts.get(document_type);

    let capacity = layout.item_capacity();
    if request.items.len() > capacity {
        return Err(DocumentError::TooManyLineItems {
            count: request.items.len(),
            capacity,
        });
    }

    let items = LineItemInput::parse_all(&request.items)?;
    let totals = Aggregator::new(document_type).calculate(&items, &request.remarks)?;

    let mut cells = CellMap::new();
    write_profile(&mut cells, profile, document_type);
    write_header(&mut cells, request, issued_on);
    write_items(&mut cells, &layout, &items, &totals);
    write_totals(&mut cells, &layout, &totals);

    if let Some(remarks) = &totals.remarks {
        cells.set_text(CellRef::new('A', layout.remarks_row), remarks.as_str());
    }

    info!(
        document_type = %document_type,
        client = %request.client_name,
        items = items.len(),
        cells = cells.len(),
        "Composed document"
    );

    Ok(ComposedDocument {
        document_type,
        subject: request.details.subject().map(str::to_string),
        cells,
        totals,
    })
}

fn write_profile(
    cells: &mut CellMap,
    profile: &CompanyProfile,
    document_type: DocumentType,
) {
    cells.set_text(CellRef::new('F', 5), profile.company_name.as_str());
    cells.set_text(CellRef::new('G', 6), profile.postal_code.as_str());
    cells.set_text(CellRef::new('G', 7), profile.address.as_str());
    cells.set_text(CellRef::new('G', 8), profile.address_detail.as_str());
    cells.set_text(CellRef::new('G', 9), profile.phone_number.as_str());
    cells.set_text(CellRef::new('G', 10), profile.contact_person.as_str());

    if !document_type.shows_bank_account() {
        return;
    }

    match &profile.bank_account {
        Some(bank) => {
            cells.set_text(CellRef::new('G', 11), bank.account_type.as_str());
            cells.set_text(CellRef::new('G', 12), bank.bank_branch.as_str());
            cells.set_text(CellRef::new('G', 13), bank.account_number.as_str());
            cells.set_text(CellRef::new('G', 14), bank.account_name.as_str());
        }
        None => debug!("No bank account on record; invoice bank block left blank"),
    }
}

fn write_header(
    cells: &mut CellMap,
    request: &DocumentRequest,
    issued_on: NaiveDate,
) {
    let issued = issued_on.format(DATE_FORMAT).to_string();

    cells.set_text(CellRef::new('A', 2), request.client_name.as_str());

    match &request.details {
        DocumentDetails::Estimate(terms) | DocumentDetails::Invoice(terms) => {
            cells.set_text(CellRef::new('B', 5), request.client_name.as_str());
            cells.set_text(CellRef::new('B', 6), issued);
            cells.set_text(
                CellRef::new('B', 7),
                terms.expiry_date.format(DATE_FORMAT).to_string(),
            );
            cells.set_text(CellRef::new('B', 8), terms.delivery_date.as_str());
            cells.set_text(CellRef::new('B', 9), terms.delivery_place.as_str());
            cells.set_text(CellRef::new('B', 10), terms.transaction_method.as_str());
        }
        DocumentDetails::Receipt(terms) => {
            cells.set_text(CellRef::new('B', 5), issued.as_str());
            cells.set_text(CellRef::new('B', 6), issued);
            cells.set_text(
                CellRef::new('B', 7),
                terms.retention_until.format(DATE_FORMAT).to_string(),
            );
            cells.set_text(CellRef::new('B', 8), terms.delivery_place.as_str());
            cells.set_text(CellRef::new('B', 9), terms.transaction_method.as_str());
        }
    }
}

fn write_items(
    cells: &mut CellMap,
    layout: &DocumentLayout,
    items: &[LineItem],
    totals: &AggregationResult,
) {
    for (index, (item, row_total)) in items.iter().zip(&totals.rows).enumerate() {
        let row = layout.item_row(index);

        cells.set_text(CellRef::new('A', row), item.description.as_str());
        cells.set_number(CellRef::new('D', row), item.quantity);
        cells.set_text(CellRef::new('E', row), item.unit.as_str());
        cells.set_number(CellRef::new('F', row), item.unit_price);
        cells.set_number(CellRef::new('G', row), item.discount);
        cells.set_percent(CellRef::new('H', row), item.tax_rate);
        cells.set_number(CellRef::new('I', row), row_total.subtotal);
    }
}

fn write_totals(
    cells: &mut CellMap,
    layout: &DocumentLayout,
    totals: &AggregationResult,
) {
    let row = layout.totals_row;
    cells.set_number(CellRef::new('I', row), totals.total_excluding_tax);
    cells.set_number(CellRef::new('I', row + 1), totals.total_tax);
    cells.set_number(CellRef::new('I', row + 2), totals.total_including_tax);

    for (offset, bucket) in TaxBucket::ALL.into_iter().enumerate() {
        let row = layout.bucket_row + offset as u32;
        let total = totals.buckets.get(bucket);

        cells.set_number(CellRef::new('B', row), total.subtotal);
        cells.set_number(CellRef::new('C', row), total.tax);
    }
}
