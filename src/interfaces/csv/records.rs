use crate::domain::payout::{Payout, PayoutOutcome};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the received-payments record for a run: one row per computed
/// payout, keyed by the run-start epoch so repeated runs never collide.
/// The header is written even when the batch is empty.
pub fn write_payments_received(
    dir: &Path,
    run_started: i64,
    payouts: &[Payout],
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("payments_received_{run_started}.csv"));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    writer.write_record(["Payment Number", "Payment Value (Sat)"])?;
    for payout in payouts {
        writer.serialize((payout.number, payout.amount.0))?;
    }
    writer.flush()?;
    Ok(path)
}

/// Writes the successful-payouts record for a run: one row per payout
/// that actually went through, with the channel that carried it.
pub fn write_successful_payouts<'a>(
    dir: &Path,
    run_started: i64,
    successes: impl Iterator<Item = &'a PayoutOutcome>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("successful_payouts_{run_started}.csv"));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    writer.write_record(["Payment", "Channel ID"])?;
    for outcome in successes {
        writer.serialize((outcome.payout.amount.0, outcome.channel.0))?;
    }
    writer.flush()?;
    Ok(path)
}
