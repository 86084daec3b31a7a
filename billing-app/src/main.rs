use std::path::PathBuf;

use anyhow::Context;
use billing_app::app;
use billing_app::config::AppConfig;
use billing_app::logging;
use billing_core::db::{DbConfig, ProfileRepository};
use billing_core::{BankAccount, CompanyProfile, DocumentError};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Fills estimates, invoices and receipts from the stored company profile
/// and a list of line items.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend; overrides the configuration.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string; overrides the configuration.
    /// For SQLite this is a file path (e.g. `billing.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log filter (`warn`, `debug`, or any RUST_LOG directive).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show or change the company profile printed on every document.
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Fill a document and save it as an xlsx workbook.
    Generate {
        /// Request file (TOML).
        #[arg(long)]
        request: PathBuf,

        /// Line items as CSV; replaces items listed in the request.
        #[arg(long)]
        items: Option<PathBuf>,

        /// Output path; defaults to `<output_dir>/<label>_<yyyyMMddHHmm>.xlsx`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the totals of a CSV of line items.
    Aggregate {
        /// estimate, invoice or receipt.
        #[arg(long = "type")]
        document_type: String,

        #[arg(long)]
        items: PathBuf,

        #[arg(long, default_value = "")]
        remarks: String,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    Show,
    Set(ProfileArgs),
}

#[derive(Debug, Args)]
struct ProfileArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    postal_code: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    address_detail: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    contact: String,
    /// Bank account, printed on invoices only.
    #[arg(long)]
    account_type: Option<String>,
    #[arg(long)]
    bank_branch: Option<String>,
    #[arg(long)]
    account_number: Option<String>,
    #[arg(long)]
    account_name: Option<String>,
}

impl From<ProfileArgs> for CompanyProfile {
    fn from(args: ProfileArgs) -> Self {
        CompanyProfile {
            company_name: args.name,
            postal_code: args.postal_code,
            address: args.address,
            address_detail: args.address_detail,
            phone_number: args.phone,
            contact_person: args.contact,
            bank_account: BankAccount::from_parts(
                args.account_type,
                args.bank_branch,
                args.account_number,
                args.account_name,
            ),
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }
    if let Some(db) = cli.db {
        config.database.connection_string = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    logging::init_logging(&config.log_level);
    if let Some(path) = &config.log_file {
        logging::enable_file_logging(path)?;
    }

    match cli.command {
        Command::Aggregate {
            document_type,
            items,
            remarks,
        } => {
            let result = app::aggregate_file(&document_type, &items, &remarks)?;
            print!("{}", app::format_totals(&result));
        }
        Command::Profile(command) => {
            let repo = open_store(&config).await?;
            run_profile(command, &*repo).await?;
        }
        Command::Generate {
            request,
            items,
            output,
        } => {
            let repo = open_store(&config).await?;
            let document_request = app::load_request(&request, items.as_deref())?;
            let now = Local::now().naive_local();
            let output = output.unwrap_or_else(|| {
                app::default_output_path(&config.output_dir, document_request.document_type(), now)
            });
            let layouts = config.layout_table()?;
            let template = config.templates.get(document_request.document_type());

            let generated = app::generate(
                &*repo,
                &layouts,
                template,
                &document_request,
                &output,
                now,
            )
            .await
            .map_err(|e| {
                if matches!(
                    e.downcast_ref::<DocumentError>(),
                    Some(DocumentError::ProfileUnavailable)
                ) {
                    e.context("Register the company first with `profile set --name <company>`")
                } else {
                    e
                }
            })?;

            print!("{}", app::format_totals(&generated.totals));
            println!("Saved {}", generated.path.display());
        }
    }

    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Box<dyn ProfileRepository>> {
    let db_config = DbConfig::from(&config.database);
    debug!("connecting to {} backend", db_config.backend);
    app::build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open {} database", db_config.backend))
}

async fn run_profile(
    command: ProfileCommand,
    repo: &dyn ProfileRepository,
) -> anyhow::Result<()> {
    match command {
        ProfileCommand::Show => match repo.get_profile().await? {
            Some(profile) => print!("{}", app::format_profile(&profile)),
            None => println!("No company profile on record. Run `profile set --name <company>`."),
        },
        ProfileCommand::Set(args) => {
            let profile = CompanyProfile::from(args);
            repo.save_profile(&profile).await?;
            println!("Saved company profile for '{}'.", profile.company_name);
        }
    }
    Ok(())
}
