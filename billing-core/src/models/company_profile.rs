use serde::{Deserialize, Serialize};

/// The issuing company, as printed in the sender block of every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
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

    // Printed on invoices only
    #[serde(default)]
    pub bank_account: Option<BankAccount>,
}

/// Transfer destination shown on invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// e.g. "普通" or "当座"
    #[serde(default)]
    pub account_type: String,
    /// Bank and branch name.
    #[serde(default)]
    pub bank_branch: String,
    #[serde(default)]
    pub account_number: String,
    /// Account holder name.
    #[serde(default)]
    pub account_name: String,
}

impl BankAccount {
    /// Builds an account from the four stored columns, or `None` when none
    /// of them holds a value.
    pub fn from_parts(
        account_type: Option<String>,
        bank_branch: Option<String>,
        account_number: Option<String>,
        account_name: Option<String>,
    ) -> Option<Self> {
        let parts = [&account_type, &bank_branch, &account_number, &account_name];
        if parts
            .iter()
            .all(|p| p.as_deref().is_none_or(|v| v.trim().is_empty()))
        {
            return None;
        }

        Some(Self {
            account_type: account_type.unwrap_or_default(),
            bank_branch: bank_branch.unwrap_or_default(),
            account_number: account_number.unwrap_or_default(),
            account_name: account_name.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn from_parts_is_none_when_every_column_is_empty() {
        let account = BankAccount::from_parts(None, Some("  ".to_string()), None, Some(String::new()));

        assert_eq!(account, None);
    }

    #[test]
    fn from_parts_fills_missing_columns_with_empty_text() {
        let account = BankAccount::from_parts(
            Some("普通".to_string()),
            None,
            Some("1234567".to_string()),
            None,
        );

        assert_eq!(
            account,
            Some(BankAccount {
                account_type: "普通".to_string(),
                bank_branch: String::new(),
                account_number: "1234567".to_string(),
                account_name: String::new(),
            })
        );
    }
}
