use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::debug;

use billing_core::{BankAccount, CompanyProfile, ProfileRepository, RepositoryError};

/// The profile always lives in this row.
const PROFILE_ID: i64 = 1;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to `database_url` (a sqlx URL such as `sqlite:billing.db?mode=rwc`).
    ///
    /// In-memory databases are per connection, so the pool is capped at one
    /// connection that is never recycled.
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_profile(row: &SqliteRow) -> Result<CompanyProfile, RepositoryError> {
    let text = |column: &str| row.try_get::<String, _>(column).map_err(db_error);
    let optional = |column: &str| row.try_get::<Option<String>, _>(column).map_err(db_error);

    Ok(CompanyProfile {
        company_name: text("company_name")?,
        postal_code: text("postal_code")?,
        address: text("address")?,
        address_detail: text("address_detail")?,
        phone_number: text("phone_number")?,
        contact_person: text("contact_person")?,
        bank_account: BankAccount::from_parts(
            optional("account_type")?,
            optional("bank_branch")?,
            optional("account_number")?,
            optional("account_name")?,
        ),
    })
}

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn get_profile(&self) -> Result<Option<CompanyProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT company_name, postal_code, address, address_detail, phone_number,
                    contact_person, account_type, bank_branch, account_number, account_name
             FROM company_info
             WHERE id = ?",
        )
        .bind(PROFILE_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn save_profile(
        &self,
        profile: &CompanyProfile,
    ) -> Result<(), RepositoryError> {
        let bank = profile.bank_account.as_ref();

        sqlx::query(
            "INSERT INTO company_info (
                id, company_name, postal_code, address, address_detail, phone_number,
                contact_person, account_type, bank_branch, account_number, account_name
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                company_name = excluded.company_name,
                postal_code = excluded.postal_code,
                address = excluded.address,
                address_detail = excluded.address_detail,
                phone_number = excluded.phone_number,
                contact_person = excluded.contact_person,
                account_type = excluded.account_type,
                bank_branch = excluded.bank_branch,
                account_number = excluded.account_number,
                account_name = excluded.account_name,
                updated_at = datetime('now')",
        )
        .bind(PROFILE_ID)
        .bind(&profile.company_name)
        .bind(&profile.postal_code)
        .bind(&profile.address)
        .bind(&profile.address_detail)
        .bind(&profile.phone_number)
        .bind(&profile.contact_person)
        .bind(bank.map(|b| b.account_type.as_str()))
        .bind(bank.map(|b| b.bank_branch.as_str()))
        .bind(bank.map(|b| b.account_number.as_str()))
        .bind(bank.map(|b| b.account_name.as_str()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(company = %profile.company_name, "Saved company profile");
        Ok(())
    }

    async fn delete_profile(&self) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM company_info WHERE id = ?")
            .bind(PROFILE_ID)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
