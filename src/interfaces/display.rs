//! Plain-column stdout tables for the interactive run. Logging goes to
//! `tracing`; this module is only the human-readable surface.

use crate::domain::channel::EligibleChannel;
use crate::domain::invoice::Invoice;
use crate::domain::payout::{Payout, PayoutReport};
use chrono::DateTime;

pub fn print_settled_invoices(invoices: &[&Invoice]) {
    println!(
        "{:<20} {:>18}  {}",
        "Creation Date", "Amount Paid (Sat)", "R Hash"
    );
    for invoice in invoices {
        let when = DateTime::from_timestamp(invoice.creation_time, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| invoice.creation_time.to_string());
        println!(
            "{:<20} {:>18}  {}",
            when, invoice.amount_paid, invoice.hash
        );
    }
}

pub fn print_payouts(payouts: &[Payout]) {
    println!("{:<16} {}", "Payment Number", "Payment Value (Sat)");
    for payout in payouts {
        println!("{:<16} {}", payout.number, payout.amount);
    }
}

pub fn print_eligible_channels(channels: &[EligibleChannel]) {
    println!(
        "{:<20} {:>8} {:>16} {:>16}",
        "Channel ID", "Ratio", "Local (Sat)", "Capacity (Sat)"
    );
    for channel in channels {
        println!(
            "{:<20} {:>8.4} {:>16} {:>16}",
            channel.id, channel.local_balance_ratio, channel.local_balance, channel.capacity
        );
    }
}

pub fn print_report(report: &PayoutReport) {
    let successes: Vec<_> = report.successes().collect();
    if successes.is_empty() {
        println!("\nNo payments could be processed successfully.");
        return;
    }

    println!("\nSuccessful payments:");
    println!("{:<16} {}", "Payment (Sat)", "Channel ID");
    for outcome in &successes {
        println!("{:<16} {}", outcome.payout.amount, outcome.channel);
    }
    println!(
        "\nPaid out {} of {} total.",
        report.succeeded_amount(),
        report.total
    );
}
