//! Import Cost Engine CLI
//!
//! Interactive console for estimating the landed cost of a vehicle imported
//! from Japan.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! cargo run -- --schedule floored --fallback-rate 0.62
//! cargo run -- --schedule-file schedule.toml --admin-id 0 --log-file data/calculations.csv
//! RUST_LOG=import_cost_engine=debug cargo run -- --skip-logistics
//! ```
//!
//! Type `/start` to begin, answer each question on its own line, and `/quit`
//! to leave. Logs go to stderr, conversation output to stdout.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid schedule file, HTTP client setup, broken stdin/stdout)

use import_cost_engine::cli::{self, CliArgs};
use import_cost_engine::{AdminList, CalculatorService, CbrRateProvider, CsvResultLog, RateService};
use std::error::Error;
use std::process;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "import_cost_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    if let Err(e) = run(args).await {
        error!(error = %e, "fatal error");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<(), Box<dyn Error>> {
    let config = args.to_service_config()?;

    let provider = CbrRateProvider::new(args.rate_url.as_str(), args.rate_timeout())?;
    let mut rates = RateService::new(Arc::new(provider)).with_timeout(args.rate_timeout());
    if let Some(value) = args.fallback_rate {
        rates = rates.with_fallback(value)?;
    }
    if let Some(value) = args.rate_override {
        rates = rates.with_override(value)?;
    }

    let service = CalculatorService::new(
        rates,
        Arc::new(CsvResultLog::new(&args.log_file)),
        Arc::new(AdminList::new(args.admin_ids.iter().copied())),
        config,
    );

    info!(
        log_file = %args.log_file.display(),
        rate_url = %args.rate_url,
        admins = args.admin_ids.len(),
        "calculator ready"
    );

    cli::run_console(
        &service,
        args.user_id,
        args.chat_id,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    Ok(())
}
