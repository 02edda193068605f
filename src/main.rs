use clap::Parser;
use loanbook::application::engine::LoanEngine;
use loanbook::domain::loan::{BorrowerId, LoanRecord};
use loanbook::domain::policy::UnderwritingConfig;
use loanbook::domain::ports::LoanStoreBox;
use loanbook::error::LoanError;
use loanbook::infrastructure::in_memory::InMemoryLoanStore;
use loanbook::interfaces::csv::action_reader::{ActionReader, ActionType, LoanAction};
use loanbook::interfaces::csv::record_writer::LoanBookWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input loan actions CSV file
    input: PathBuf,

    /// Path to persistent database (optional). Requires the storage-rocksdb feature.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Underwriting policy JSON file. Defaults apply when omitted.
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.policy {
        Some(path) => {
            let text = std::fs::read_to_string(path).into_diagnostic()?;
            serde_json::from_str(&text).into_diagnostic()?
        }
        None => UnderwritingConfig::default(),
    };

    let store = open_store(cli.db_path)?;
    let engine = LoanEngine::new(store, config);

    // Process actions; a bad row or a rejected action never aborts the batch.
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = ActionReader::new(file);
    for action_result in reader.actions() {
        match action_result {
            Ok(action) => {
                if let Err(e) = dispatch(&engine, action).await {
                    tracing::warn!(error = %e, "action rejected");
                }
            }
            Err(e) => {
                eprintln!("Error reading action: {}", e);
            }
        }
    }

    // Output the final loan book.
    let records = engine.into_results().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = LoanBookWriter::new(stdout.lock());
    writer.write_records(records).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<LoanStoreBox> {
    use loanbook::infrastructure::rocksdb::RocksDbLoanStore;
    match db_path {
        Some(path) => Ok(Box::new(
            RocksDbLoanStore::open(path).into_diagnostic()?,
        )),
        None => Ok(Box::new(InMemoryLoanStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<LoanStoreBox> {
    if db_path.is_some() {
        return Err(miette::miette!(
            "--db-path requires building with the storage-rocksdb feature"
        ));
    }
    Ok(Box::new(InMemoryLoanStore::new()))
}

async fn dispatch(engine: &LoanEngine, action: LoanAction) -> loanbook::error::Result<LoanRecord> {
    if action.borrower.is_empty() {
        return Err(LoanError::InvalidInput("Missing borrower id".to_string()));
    }
    let borrower = BorrowerId::new(action.borrower);

    match action.action {
        ActionType::Request => {
            let principal = action
                .amount
                .ok_or_else(|| LoanError::InvalidInput("Request missing amount".to_string()))?;
            let income = action
                .income
                .ok_or_else(|| LoanError::InvalidInput("Request missing income".to_string()))?;
            let credit_score = action.credit_score.ok_or_else(|| {
                LoanError::InvalidInput("Request missing credit score".to_string())
            })?;
            engine
                .request_loan(borrower, principal, income, credit_score)
                .await
        }
        ActionType::Approve => engine.approve_loan(&borrower).await,
        ActionType::Payment => {
            let amount = action
                .amount
                .ok_or_else(|| LoanError::InvalidInput("Payment missing amount".to_string()))?;
            engine
                .make_payment(&borrower, amount, action.late.unwrap_or(false))
                .await
        }
        ActionType::Penalty => engine.apply_penalty(&borrower).await,
    }
}
