use chrono::NaiveDate;
use clap::Parser;
use lnpayout::application::session::{DateWindow, PayoutSession, SessionOutcome};
use lnpayout::config::Settings;
use lnpayout::domain::payout::RunHalt;
use lnpayout::domain::ports::{ConfirmationGateRef, InvoiceIssuerRef, LedgerNodeRef};
use lnpayout::infrastructure::lnd_rest::LndRestNode;
use lnpayout::infrastructure::lnurl::LnurlPayIssuer;
use lnpayout::interfaces::prompt::{self, StdinGate};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for the per-run CSV record files
    #[arg(long, default_value = "csv")]
    csv_dir: PathBuf,

    /// Start of the settlement window (YYYY-MM-DD); prompted for when omitted
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// End of the settlement window (YYYY-MM-DD); prompted for when omitted
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().into_diagnostic()?;

    let node: LedgerNodeRef = Arc::new(LndRestNode::from_settings(&settings.node).into_diagnostic()?);
    let issuer: InvoiceIssuerRef =
        Arc::new(LnurlPayIssuer::new(&settings.lnurl_link).into_diagnostic()?);
    let gate: ConfirmationGateRef = Arc::new(StdinGate);

    let start = match cli.start_date {
        Some(date) => date,
        None => prompt::read_date("Enter the start date (YYYY-MM-DD): ", None)
            .into_diagnostic()?,
    };
    let end = match cli.end_date {
        Some(date) => date,
        None => prompt::read_date("Enter the end date (YYYY-MM-DD): ", Some(start))
            .into_diagnostic()?,
    };
    let window = DateWindow::from_dates(start, end).into_diagnostic()?;

    let session = PayoutSession::new(node, issuer, gate, &settings, cli.csv_dir);
    match session.run(window).await.into_diagnostic()? {
        SessionOutcome::NothingReceived => {
            println!("No payments received during the specified time range.");
        }
        SessionOutcome::NoEligibleChannels { .. } => {
            println!("No eligible channels to make the payment.");
        }
        SessionOutcome::Completed(report) => {
            if let RunHalt::Aborted { .. } = report.halt {
                println!("User cancelled the payout.");
            }
        }
    }

    Ok(())
}
