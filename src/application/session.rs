use crate::application::orchestrator::PayoutOrchestrator;
use crate::config::Settings;
use crate::domain::amount::Sat;
use crate::domain::channel;
use crate::domain::invoice::Invoice;
use crate::domain::payout::{Payout, PayoutReport};
use crate::domain::ports::{ConfirmationGateRef, InvoiceIssuerRef, LedgerNodeRef};
use crate::domain::split::split_into_payouts;
use crate::error::{PayoutError, Result};
use crate::interfaces::csv::records;
use crate::interfaces::display;
use chrono::{NaiveDate, NaiveTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

/// The settlement window to reconcile, as unix second bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start_unix: i64,
    pub end_unix: i64,
}

impl DateWindow {
    /// Builds a window from two calendar dates at midnight UTC. The end
    /// date must be strictly after the start date.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(PayoutError::Configuration(
                "end date must be after start date".into(),
            ));
        }
        Ok(Self {
            start_unix: to_unix(start),
            end_unix: to_unix(end),
        })
    }
}

fn to_unix(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// How a session run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// No settled invoices in the window; nothing to pay out. The
    /// channel snapshot is never queried in this case.
    NothingReceived,
    /// Invoices were aggregated but no channel passed the eligibility
    /// filter.
    NoEligibleChannels { total: Sat },
    /// The orchestrator ran; the report says how far it got.
    Completed(PayoutReport),
}

/// Top-level composition: reconciles settled invoices over a date
/// window, splits the total, ranks channels, and hands the batch to the
/// orchestrator. Writes the per-run record files as a side effect.
pub struct PayoutSession {
    node: LedgerNodeRef,
    orchestrator: PayoutOrchestrator,
    max_payment_amount: Sat,
    preferred_ratio: f64,
    csv_dir: PathBuf,
}

impl PayoutSession {
    pub fn new(
        node: LedgerNodeRef,
        issuer: InvoiceIssuerRef,
        gate: ConfirmationGateRef,
        settings: &Settings,
        csv_dir: PathBuf,
    ) -> Self {
        let orchestrator = PayoutOrchestrator::new(
            node.clone(),
            issuer,
            gate,
            settings.timeout_secs,
            settings.max_retries,
        );
        Self {
            node,
            orchestrator,
            max_payment_amount: settings.max_payment_amount,
            preferred_ratio: settings.preferred_local_balance_ratio,
            csv_dir,
        }
    }

    pub async fn run(&self, window: DateWindow) -> Result<SessionOutcome> {
        // Record files for this run are keyed by its start time.
        let run_started = Utc::now().timestamp();

        let balance = self.node.wallet_balance().await?;
        info!(total_balance = %balance.total, "wallet balance");
        println!("Wallet balance (sat): {}", balance.total);

        let invoices = self
            .node
            .list_invoices(window.start_unix, window.end_unix)
            .await?;
        let settled: Vec<&Invoice> = invoices.iter().filter(|invoice| invoice.settled).collect();
        display::print_settled_invoices(&settled);

        let total: Sat = settled.iter().map(|invoice| invoice.amount_paid).sum();
        info!(%total, "total settled over window");
        println!("\nTotal amount paid (sat): {total}\n");

        let amounts = split_into_payouts(total, self.max_payment_amount);
        let split_sum: Sat = amounts.iter().sum();
        if split_sum != total {
            return Err(PayoutError::Consistency {
                split: split_sum,
                settled: total,
            });
        }

        let payouts: Vec<Payout> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| Payout {
                number: i + 1,
                amount,
            })
            .collect();
        display::print_payouts(&payouts);

        let path = records::write_payments_received(&self.csv_dir, run_started, &payouts)?;
        info!(path = %path.display(), "wrote received payments record");

        if total.is_zero() {
            info!("no payments received during the specified window");
            return Ok(SessionOutcome::NothingReceived);
        }

        // Eligibility is probed once with the largest payout of the
        // batch and the resulting order is reused for every payout.
        let probe = payouts
            .iter()
            .map(|payout| payout.amount)
            .max()
            .unwrap_or_default();
        let channels = self.node.active_channels().await?;
        let eligible = channel::rank(&channels, probe, self.preferred_ratio);
        display::print_eligible_channels(&eligible);

        if eligible.is_empty() {
            warn!("no eligible channels to make the payout");
            return Ok(SessionOutcome::NoEligibleChannels { total });
        }

        let report = self.orchestrator.run(&payouts, &eligible).await?;

        let path =
            records::write_successful_payouts(&self.csv_dir, run_started, report.successes())?;
        info!(path = %path.display(), "wrote successful payouts record");
        display::print_report(&report);

        Ok(SessionOutcome::Completed(report))
    }
}
