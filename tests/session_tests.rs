mod common;

use common::*;
use lnpayout::application::session::{DateWindow, PayoutSession, SessionOutcome};
use lnpayout::config::{NodeSettings, Settings};
use lnpayout::domain::amount::Sat;
use lnpayout::domain::channel::ChannelId;
use lnpayout::domain::payout::RunHalt;
use lnpayout::domain::ports::{ConfirmationGateRef, InvoiceIssuerRef, LedgerNodeRef};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn settings(max_payment_amount: u64) -> Settings {
    Settings {
        max_payment_amount: Sat(max_payment_amount),
        preferred_local_balance_ratio: 0.0,
        timeout_secs: 60,
        max_retries: 3,
        lnurl_link: String::new(),
        node: NodeSettings {
            rest_url: String::new(),
            tls_cert_path: Default::default(),
            macaroon_path: Default::default(),
        },
    }
}

fn session(
    node: Arc<ScriptedNode>,
    issuer: Arc<ScriptedIssuer>,
    gate: Arc<ScriptedGate>,
    max_payment_amount: u64,
    csv_dir: &Path,
) -> PayoutSession {
    let node_ref: LedgerNodeRef = node;
    let issuer_ref: InvoiceIssuerRef = issuer;
    let gate_ref: ConfirmationGateRef = gate;
    PayoutSession::new(
        node_ref,
        issuer_ref,
        gate_ref,
        &settings(max_payment_amount),
        csv_dir.to_path_buf(),
    )
}

fn window() -> DateWindow {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    DateWindow::from_dates(start, end).unwrap()
}

fn record_files(dir: &Path, prefix: &str) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(prefix))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_zero_settled_total_exits_before_channel_query() {
    let dir = tempfile::tempdir().unwrap();
    // Only an unsettled invoice in the window: it must not count.
    let node = Arc::new(ScriptedNode::new().with_invoices(vec![open_invoice(500)]));
    let issuer = Arc::new(ScriptedIssuer::new());
    let gate = Arc::new(ScriptedGate::approving());
    let session = session(node.clone(), issuer.clone(), gate, 100, dir.path());

    let outcome = session.run(window()).await.unwrap();

    assert_eq!(outcome, SessionOutcome::NothingReceived);
    assert_eq!(node.channel_queries.load(Ordering::SeqCst), 0);
    assert!(node.sends_attempted().is_empty());
    assert_eq!(issuer.call_count(), 0);

    // The received-payments record is still written, header only.
    let received = record_files(dir.path(), "payments_received_");
    assert_eq!(received.len(), 1);
    let contents = std::fs::read_to_string(&received[0]).unwrap();
    assert_eq!(contents.trim(), "Payment Number,Payment Value (Sat)");
}

#[tokio::test]
async fn test_full_run_splits_settled_total_and_pays_out() {
    let dir = tempfile::tempdir().unwrap();
    let node = Arc::new(
        ScriptedNode::new()
            .with_invoices(vec![
                settled_invoice(100),
                settled_invoice(150),
                open_invoice(999),
            ])
            .with_channels(vec![channel(7, 1000, 900)])
            .script_send(succeeded())
            .script_send(succeeded())
            .script_send(succeeded()),
    );
    let issuer = Arc::new(ScriptedIssuer::new());
    let gate = Arc::new(ScriptedGate::approving());
    let session = session(node.clone(), issuer.clone(), gate, 100, dir.path());

    let outcome = session.run(window()).await.unwrap();

    let SessionOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.halt, RunHalt::Completed);
    assert_eq!(report.total, Sat(250));
    assert_eq!(report.succeeded_amount(), Sat(250));
    // 250 over a 100 cap: [83, 83, 84], one invoice per payout.
    assert_eq!(issuer.call_count(), 3);
    assert_eq!(
        node.sends_attempted(),
        vec![ChannelId(7), ChannelId(7), ChannelId(7)]
    );

    let received = record_files(dir.path(), "payments_received_");
    assert_eq!(received.len(), 1);
    let contents = std::fs::read_to_string(&received[0]).unwrap();
    assert_eq!(
        contents.lines().collect::<Vec<_>>(),
        vec![
            "Payment Number,Payment Value (Sat)",
            "1,83",
            "2,83",
            "3,84"
        ]
    );

    let payouts = record_files(dir.path(), "successful_payouts_");
    assert_eq!(payouts.len(), 1);
    let contents = std::fs::read_to_string(&payouts[0]).unwrap();
    assert_eq!(
        contents.lines().collect::<Vec<_>>(),
        vec!["Payment,Channel ID", "83,7", "83,7", "84,7"]
    );
}

#[tokio::test]
async fn test_exhaustion_writes_partial_payout_record() {
    let dir = tempfile::tempdir().unwrap();
    let node = Arc::new(
        ScriptedNode::new()
            .with_invoices(vec![settled_invoice(250)])
            .with_channels(vec![channel(7, 1000, 900)])
            .script_send(succeeded())
            .script_send(failed(
                lnpayout::domain::payout::FailureReason::NoRoute,
            )),
    );
    let issuer = Arc::new(ScriptedIssuer::new());
    let gate = Arc::new(ScriptedGate::approving());
    let session = session(node.clone(), issuer.clone(), gate, 100, dir.path());

    let outcome = session.run(window()).await.unwrap();

    let SessionOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.halt, RunHalt::ChannelsExhausted { payout_number: 2 });
    assert_eq!(report.succeeded_amount(), Sat(83));
    // The third payout was never issued an invoice.
    assert_eq!(issuer.call_count(), 2);

    let payouts = record_files(dir.path(), "successful_payouts_");
    let contents = std::fs::read_to_string(&payouts[0]).unwrap();
    assert_eq!(
        contents.lines().collect::<Vec<_>>(),
        vec!["Payment,Channel ID", "83,7"]
    );
}

#[tokio::test]
async fn test_eligibility_probed_with_largest_payout() {
    let dir = tempfile::tempdir().unwrap();
    // Channel 1 can cover the 83 sat payouts but not the 84 sat one;
    // the probe uses the largest payout, so only channel 2 qualifies.
    let node = Arc::new(
        ScriptedNode::new()
            .with_invoices(vec![settled_invoice(250)])
            .with_channels(vec![channel(1, 1000, 83), channel(2, 1000, 900)])
            .script_send(succeeded())
            .script_send(succeeded())
            .script_send(succeeded()),
    );
    let issuer = Arc::new(ScriptedIssuer::new());
    let gate = Arc::new(ScriptedGate::approving());
    let session = session(node.clone(), issuer, gate, 100, dir.path());

    let outcome = session.run(window()).await.unwrap();

    let SessionOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.halt, RunHalt::Completed);
    assert!(
        node.sends_attempted()
            .iter()
            .all(|&channel| channel == ChannelId(2))
    );
}

#[tokio::test]
async fn test_no_eligible_channels_skips_orchestration() {
    let dir = tempfile::tempdir().unwrap();
    let node = Arc::new(
        ScriptedNode::new()
            .with_invoices(vec![settled_invoice(250)])
            .with_channels(vec![channel(1, 1000, 10)]),
    );
    let issuer = Arc::new(ScriptedIssuer::new());
    let gate = Arc::new(ScriptedGate::approving());
    let session = session(node.clone(), issuer.clone(), gate, 100, dir.path());

    let outcome = session.run(window()).await.unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::NoEligibleChannels { total: Sat(250) }
    );
    assert!(node.sends_attempted().is_empty());
    assert_eq!(issuer.call_count(), 0);
}

#[tokio::test]
async fn test_abort_still_records_prior_successes() {
    let dir = tempfile::tempdir().unwrap();
    let node = Arc::new(
        ScriptedNode::new()
            .with_invoices(vec![settled_invoice(250)])
            .with_channels(vec![channel(7, 1000, 900)])
            .script_send(succeeded()),
    );
    let issuer = Arc::new(ScriptedIssuer::new());
    let gate = Arc::new(
        ScriptedGate::approving()
            .decide(lnpayout::domain::ports::Decision::Approved)
            .decide(lnpayout::domain::ports::Decision::Declined),
    );
    let session = session(node, issuer, gate, 100, dir.path());

    let outcome = session.run(window()).await.unwrap();

    let SessionOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.halt, RunHalt::Aborted { payout_number: 2 });
    assert_eq!(report.succeeded_amount(), Sat(83));

    let payouts = record_files(dir.path(), "successful_payouts_");
    let contents = std::fs::read_to_string(&payouts[0]).unwrap();
    assert_eq!(
        contents.lines().collect::<Vec<_>>(),
        vec!["Payment,Channel ID", "83,7"]
    );
}
