use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use billing_data::ProfileLoader;
use billing_db_sqlite::SqliteRepository;

use clap::Parser;

/// Import the company profile from a CSV file into the database.
///
/// The CSV file holds a header row and exactly one data row with the
/// columns:
/// - company_name (required)
/// - postal_code, address, address_detail, phone_number, contact_person
/// - account_type, bank_branch, account_number, account_name (shown on
///   invoices; leave blank when there is no account)
#[derive(Parser, Debug)]
#[command(name = "billing-profile-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing the company profile
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL (e.g., sqlite:billing.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:billing.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    println!("Loading company profile from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let profile = ProfileLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    ProfileLoader::load(&repo, &profile)
        .await
        .context("Failed to save company profile")?;

    println!("Saved company profile for '{}'.", profile.company_name);

    Ok(())
}
