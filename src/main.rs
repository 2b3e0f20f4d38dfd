use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use mortgage_engine::application::engine::{ApplicationFilter, MortgageEngine, ReviewDecision};
use mortgage_engine::config::{EngineConfig, TelemetryConfig};
use mortgage_engine::domain::application::ApplicationStatus;
use mortgage_engine::domain::bank::BankId;
use mortgage_engine::domain::money::{AnnualRate, Money};
use mortgage_engine::domain::ports::ApplicationStoreBox;
use mortgage_engine::domain::property::{PropertyId, UserId};
use mortgage_engine::domain::rate::{RateId, RateType};
use mortgage_engine::domain::scenario::{
    ApplicantInfo, ApplicationRequest, ComparisonScenario, LoanScenario,
};
use mortgage_engine::infrastructure::in_memory::{InMemoryApplicationStore, InMemoryBankCatalog};
use mortgage_engine::interfaces::csv::catalog_reader::CatalogReader;
use mortgage_engine::interfaces::csv::report_writer::ReportWriter;
use mortgage_engine::telemetry;
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Price one loan and print a schedule preview
    Calculate {
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        down_payment: Decimal,
        /// Annual rate in percent, e.g. 3.25
        #[arg(long)]
        rate: Decimal,
        #[arg(long)]
        term: Option<u32>,
    },
    /// List rates effective today
    Rates {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        rate_type: Option<RateType>,
    },
    /// Rank every effective rate for one purchase
    Compare {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        down_payment: Decimal,
        #[arg(long)]
        term: Option<u32>,
        #[arg(long)]
        rate_type: Option<RateType>,
    },
    /// Submit a mortgage application
    Submit {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        user: u64,
        #[arg(long)]
        bank: u32,
        #[arg(long)]
        rate_id: u32,
        #[arg(long)]
        property: Option<u64>,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        down_payment: Decimal,
        #[arg(long)]
        term: Option<u32>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        income: Decimal,
        #[arg(long, default_value = "")]
        occupation: String,
        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// List a user's applications
    Applications {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        status: Option<ApplicationStatus>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Move an application through its lifecycle
    Review {
        #[arg(long)]
        number: String,
        #[arg(long, value_enum)]
        action: Action,
        #[arg(long)]
        reason: Option<String>,
        /// Owner id, required to withdraw
        #[arg(long)]
        user: Option<u64>,
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Approve,
    Reject,
    Complete,
    Cancel,
    Withdraw,
}

fn open_store(db_path: Option<PathBuf>) -> Result<ApplicationStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use mortgage_engine::infrastructure::rocksdb::RocksDBStore;
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryApplicationStore::new()))
        }
        None => Ok(Box::new(InMemoryApplicationStore::new())),
    }
}

async fn load_catalog(path: &Path) -> Result<InMemoryBankCatalog> {
    let file = File::open(path).into_diagnostic()?;
    CatalogReader::new(file).into_catalog().await.into_diagnostic()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&TelemetryConfig::from_env()).into_diagnostic()?;
    let config = EngineConfig::from_env().into_diagnostic()?;

    let stdout = io::stdout();
    match cli.command {
        Command::Calculate {
            price,
            down_payment,
            rate,
            term,
        } => {
            let engine = MortgageEngine::new(
                config,
                Box::new(InMemoryBankCatalog::new()),
                Box::new(InMemoryApplicationStore::new()),
            );
            let result = engine
                .calculate(&LoanScenario {
                    property_price: Money::new(price),
                    down_payment: Money::new(down_payment),
                    term_months: term,
                    annual_rate: AnnualRate::from_percent(rate),
                })
                .into_diagnostic()?;
            ReportWriter::new(stdout.lock())
                .write_calculation(&result)
                .into_diagnostic()?;
        }
        Command::Rates { catalog, rate_type } => {
            let catalog = load_catalog(&catalog).await?;
            let engine = MortgageEngine::new(
                config,
                Box::new(catalog),
                Box::new(InMemoryApplicationStore::new()),
            );
            let rates = engine.list_effective_rates(rate_type).await.into_diagnostic()?;
            ReportWriter::new(stdout.lock())
                .write_rates(&rates)
                .into_diagnostic()?;
        }
        Command::Compare {
            catalog,
            price,
            down_payment,
            term,
            rate_type,
        } => {
            let catalog = load_catalog(&catalog).await?;
            let engine = MortgageEngine::new(
                config,
                Box::new(catalog),
                Box::new(InMemoryApplicationStore::new()),
            );
            let comparison = engine
                .compare_rates(&ComparisonScenario {
                    property_price: Money::new(price),
                    down_payment: Money::new(down_payment),
                    term_months: term,
                    rate_type,
                })
                .await
                .into_diagnostic()?;
            ReportWriter::new(stdout.lock())
                .write_comparison(&comparison)
                .into_diagnostic()?;
        }
        Command::Submit {
            catalog,
            user,
            bank,
            rate_id,
            property,
            price,
            down_payment,
            term,
            name,
            phone,
            email,
            income,
            occupation,
            db_path,
        } => {
            let catalog = load_catalog(&catalog).await?;
            let engine = MortgageEngine::new(config, Box::new(catalog), open_store(db_path)?);
            let application = engine
                .submit(
                    UserId(user),
                    ApplicationRequest {
                        bank_id: BankId(bank),
                        rate_id: RateId(rate_id),
                        property_id: property.map(PropertyId),
                        property_price: Money::new(price),
                        down_payment: Money::new(down_payment),
                        term_months: term,
                        applicant: ApplicantInfo {
                            name,
                            phone,
                            email,
                            monthly_income: Money::new(income),
                            occupation,
                        },
                    },
                )
                .await
                .into_diagnostic()?;
            print_json(&application)?;
        }
        Command::Applications {
            user,
            status,
            page,
            db_path,
        } => {
            let engine = MortgageEngine::new(
                config,
                Box::new(InMemoryBankCatalog::new()),
                open_store(db_path)?,
            );
            let listing = engine
                .list_applications(
                    UserId(user),
                    &ApplicationFilter {
                        status,
                        page,
                        page_size: None,
                    },
                )
                .await
                .into_diagnostic()?;
            print_json(&listing)?;
        }
        Command::Review {
            number,
            action,
            reason,
            user,
            db_path,
        } => {
            let engine = MortgageEngine::new(
                config,
                Box::new(InMemoryBankCatalog::new()),
                open_store(db_path)?,
            );
            let number = mortgage_engine::domain::application::ApplicationNumber(number);
            let updated = match action {
                Action::Withdraw => {
                    let owner = user.ok_or_else(|| miette::miette!("--user is required to withdraw"))?;
                    let application = engine
                        .get_application_by_number(UserId(owner), &number)
                        .await
                        .into_diagnostic()?;
                    engine
                        .withdraw_application(UserId(owner), application.id)
                        .await
                        .into_diagnostic()?
                }
                Action::Approve | Action::Reject | Action::Complete | Action::Cancel => {
                    let decision = match action {
                        Action::Approve => ReviewDecision::Approve { note: reason },
                        Action::Reject => ReviewDecision::Reject {
                            reason: reason.unwrap_or_default(),
                        },
                        Action::Complete => ReviewDecision::Complete,
                        Action::Cancel => ReviewDecision::Cancel,
                        Action::Withdraw => unreachable!("withdraw is handled above"),
                    };
                    let application = engine.lookup_number(&number).await.into_diagnostic()?;
                    engine
                        .review_application(application.id, decision)
                        .await
                        .into_diagnostic()?
                }
            };
            print_json(&updated)?;
        }
    }

    Ok(())
}
