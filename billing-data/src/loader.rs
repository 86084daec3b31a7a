use std::io::Read;

use billing_core::{BankAccount, CompanyProfile, ProfileRepository, RepositoryError};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when importing a company profile.
#[derive(Debug, Error)]
pub enum ProfileLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("CSV contains no profile row")]
    MissingRecord,

    #[error("CSV contains {0} profile rows; expected exactly one")]
    TooManyRecords(usize),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for ProfileLoaderError {
    fn from(err: csv::Error) -> Self {
        ProfileLoaderError::CsvParse(err.to_string())
    }
}

/// The single data row of a profile CSV file.
///
/// Columns are matched by header name. `company_name` is required; every
/// other column may be blank or omitted. The bank account is kept only if at
/// least one of its four columns has a value.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProfileRecord {
    pub company_name: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub address_detail: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub bank_branch: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
}

impl From<ProfileRecord> for CompanyProfile {
    fn from(record: ProfileRecord) -> Self {
        CompanyProfile {
            company_name: record.company_name,
            postal_code: record.postal_code,
            address: record.address,
            address_detail: record.address_detail,
            phone_number: record.phone_number,
            contact_person: record.contact_person,
            bank_account: BankAccount::from_parts(
                record.account_type,
                record.bank_branch,
                record.account_number,
                record.account_name,
            ),
        }
    }
}

/// Imports the company profile from CSV into any [`ProfileRepository`].
pub struct ProfileLoader;

impl ProfileLoader {
    /// Parse the profile from a CSV reader holding exactly one data row.
    pub fn parse<R: Read>(reader: R) -> Result<CompanyProfile, ProfileLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.deserialize() {
            let record: ProfileRecord = result?;
            records.push(record);
        }

        match records.len() {
            0 => Err(ProfileLoaderError::MissingRecord),
            1 => Ok(records.remove(0).into()),
            n => Err(ProfileLoaderError::TooManyRecords(n)),
        }
    }

    /// Store `profile`, replacing the one on record.
    pub async fn load<R: ProfileRepository + ?Sized>(
        repo: &R,
        profile: &CompanyProfile,
    ) -> Result<(), ProfileLoaderError> {
        let replaced = repo.get_profile().await?.is_some();
        repo.save_profile(profile).await?;

        info!(
            company = %profile.company_name,
            has_bank_account = profile.bank_account.is_some(),
            replaced,
            "Imported company profile"
        );
        Ok(())
    }
}
