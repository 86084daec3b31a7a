mod company_profile;
mod document_request;
mod document_type;
mod line_item;

pub use company_profile::{BankAccount, CompanyProfile};
pub use document_request::{DocumentDetails, DocumentRequest, ReceiptTerms, TradeTerms};
pub use document_type::DocumentType;
pub use line_item::{LineItem, LineItemInput};
