use clap::{Parser, Subcommand};
use miette::Report;
use payout::application::engine::{BatchSummary, SettlementEngine};
use payout::config::{DEFAULT_ORDERS_PER_PAGE, SettlementConfig};
use payout::domain::bill::parse_date;
use payout::domain::order::{CASH_PAYMENT_METHOD, COMPLETED_STATE, OrderFilter};
use payout::error::Result;
use payout::infrastructure::dataset::load_dataset;
use payout::interfaces::statement::StatementRenderer;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dataset directory (stores.csv, orders.csv, bills.json, ...)
    #[arg(long, env = "PAYOUT_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Order state code meaning "completed"
    #[arg(long, env = "PAYOUT_COMPLETED_STATE", default_value_t = COMPLETED_STATE)]
    completed_state: u32,

    /// Payment method code for cash; those orders are excluded
    #[arg(long, env = "PAYOUT_CASH_PAYMENT_METHOD", default_value_t = CASH_PAYMENT_METHOD)]
    cash_payment_method: u32,

    /// Orders listed per statement detail page
    #[arg(long, env = "PAYOUT_ORDERS_PER_PAGE", default_value_t = DEFAULT_ORDERS_PER_PAGE)]
    orders_per_page: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Settle the period of one store that contains a date
    Report {
        #[arg(long)]
        store_id: u64,

        /// Any day inside the period, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Print the settlement record as JSON instead of a statement
        #[arg(long)]
        json: bool,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Fail when the store has no contact email
        #[arg(long)]
        require_contact: bool,
    },
    /// Settle every bill with a non-zero settlement amount
    Batch {
        /// Directory receiving one statement per bill and summary.txt
        #[arg(long)]
        output_dir: PathBuf,
    },
}

impl Cli {
    fn config(&self) -> SettlementConfig {
        SettlementConfig {
            order_filter: OrderFilter {
                completed_state: self.completed_state,
                cash_payment_method: self.cash_payment_method,
            },
            orders_per_page: self.orders_per_page,
        }
    }
}

/// Exit code for bad input or a missing record.
const CLIENT_ERROR_EXIT: u8 = 2;
/// Exit code for storage, file and other failures.
const FAILURE_EXIT: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("payout=info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = if e.is_client_error() {
                CLIENT_ERROR_EXIT
            } else {
                FAILURE_EXIT
            };
            eprintln!("{:?}", Report::new(e));
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config();

    let ledger = load_dataset(&cli.data_dir, config.order_filter).await?;
    let engine = SettlementEngine::new(
        Box::new(ledger.clone()),
        Box::new(ledger.clone()),
        Box::new(ledger.clone()),
        Box::new(ledger),
    );
    let renderer = StatementRenderer::new(config.orders_per_page);

    match cli.command {
        Command::Report {
            store_id,
            date,
            json,
            output,
            require_contact,
        } => {
            let date = parse_date("date", &date)?;
            tracing::info!(store_id, %date, "generating report");

            if require_contact {
                let email = engine.contact_email(store_id).await?;
                tracing::info!(store_id, email = %email, "statement recipient");
            }

            let report = engine.settle_for_date(store_id, date).await?;
            let bytes = if json {
                let mut text = serde_json::to_string_pretty(&report.record)?;
                text.push('\n');
                text.into_bytes()
            } else {
                renderer.render(&report)?.to_bytes()
            };

            match output {
                Some(path) => fs::write(&path, bytes)?,
                None => io::stdout().lock().write_all(&bytes)?,
            }
        }
        Command::Batch { output_dir } => {
            let summary = Arc::new(engine).settle_pending().await?;
            let summary_path = write_batch(&output_dir, &summary, &renderer)?;
            println!("{}", summary_path.display());
        }
    }

    Ok(())
}

/// Writes one statement per settled bill plus a summary file; returns the summary path.
fn write_batch(dir: &Path, summary: &BatchSummary, renderer: &StatementRenderer) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut text = String::new();
    writeln!(text, "Report Generation Summary")?;
    writeln!(text, "Total reports generated: {}", summary.settled.len())?;
    writeln!(text)?;

    for (index, report) in summary.settled.iter().enumerate() {
        let file_name = format!(
            "{}_{}.txt",
            report.record.store_id,
            report.record.period.start_date.format("%Y%m%d")
        );
        let path = dir.join(&file_name);
        fs::write(&path, renderer.render(report)?.to_bytes())?;

        writeln!(
            text,
            "{}. {} (ID: {})",
            index + 1,
            report.store.name,
            report.record.store_id
        )?;
        writeln!(text, "   Path: {}", path.display())?;
        writeln!(text)?;
    }

    if !summary.skipped.is_empty() {
        writeln!(text, "Skipped (store not found): {:?}", summary.skipped)?;
    }
    for failure in &summary.failures {
        writeln!(
            text,
            "Failed: store {} bill {:?}: {}",
            failure.store_id, failure.bill_id, failure.message
        )?;
    }

    let summary_path = dir.join("summary.txt");
    fs::write(&summary_path, text)?;
    Ok(summary_path)
}
