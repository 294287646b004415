#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use lnpayout::domain::amount::Sat;
use lnpayout::domain::channel::{Channel, ChannelId, EligibleChannel};
use lnpayout::domain::invoice::{Invoice, WalletBalance};
use lnpayout::domain::payout::{
    Bolt11, FailureReason, PaymentStatus, PaymentUpdate, Payout,
};
use lnpayout::domain::ports::{
    ConfirmationGate, Decision, InvoiceIssuer, IssueError, LedgerNode, PaymentUpdates,
};
use lnpayout::error::Result;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted ledger node: canned snapshots, plus one scripted batch of
/// status updates per `send_payment` call, consumed front to back.
#[derive(Default)]
pub struct ScriptedNode {
    pub invoices: Vec<Invoice>,
    pub channels: Vec<Channel>,
    pub balance: Sat,
    pub sends: Mutex<VecDeque<Vec<PaymentUpdate>>>,
    pub send_log: Mutex<Vec<ChannelId>>,
    pub channel_queries: AtomicUsize,
}

impl ScriptedNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invoices(mut self, invoices: Vec<Invoice>) -> Self {
        self.invoices = invoices;
        self
    }

    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    /// Queues the update batch the next unscripted send call will
    /// observe.
    pub fn script_send(self, updates: Vec<PaymentUpdate>) -> Self {
        self.sends.lock().unwrap().push_back(updates);
        self
    }

    pub fn sends_attempted(&self) -> Vec<ChannelId> {
        self.send_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerNode for ScriptedNode {
    async fn wallet_balance(&self) -> Result<WalletBalance> {
        Ok(WalletBalance {
            total: self.balance,
        })
    }

    async fn list_invoices(&self, _start_unix: i64, _end_unix: i64) -> Result<Vec<Invoice>> {
        Ok(self.invoices.clone())
    }

    async fn active_channels(&self) -> Result<Vec<Channel>> {
        self.channel_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.channels.clone())
    }

    async fn send_payment(
        &self,
        _invoice: &Bolt11,
        _timeout_secs: u64,
        outgoing_channel: ChannelId,
    ) -> Result<PaymentUpdates> {
        self.send_log.lock().unwrap().push(outgoing_channel);
        let updates = self.sends.lock().unwrap().pop_front().unwrap_or_default();
        let results: Vec<Result<PaymentUpdate>> = updates.into_iter().map(Ok).collect();
        Ok(futures::stream::iter(results).boxed())
    }
}

/// Scripted issuer: queued responses first, then unlimited fresh
/// invoices.
#[derive(Default)]
pub struct ScriptedIssuer {
    pub responses: Mutex<VecDeque<std::result::Result<Bolt11, IssueError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: std::result::Result<Bolt11, IssueError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvoiceIssuer for ScriptedIssuer {
    async fn issue(&self, amount: Sat) -> std::result::Result<Bolt11, IssueError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(Bolt11(format!("lnbc-test-{call}-{amount}"))),
        }
    }
}

/// Scripted gate: queued decisions first, then approve everything.
#[derive(Default)]
pub struct ScriptedGate {
    pub decisions: Mutex<VecDeque<Decision>>,
    pub log: Mutex<Vec<(usize, ChannelId)>>,
}

impl ScriptedGate {
    pub fn approving() -> Self {
        Self::default()
    }

    pub fn decide(self, decision: Decision) -> Self {
        self.decisions.lock().unwrap().push_back(decision);
        self
    }

    pub fn prompts_seen(&self) -> Vec<(usize, ChannelId)> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfirmationGate for ScriptedGate {
    async fn confirm(&self, payout: &Payout, channel: ChannelId) -> Result<Decision> {
        self.log.lock().unwrap().push((payout.number, channel));
        Ok(self
            .decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Decision::Approved))
    }
}

pub fn update(status: PaymentStatus, reason: FailureReason) -> PaymentUpdate {
    PaymentUpdate {
        status,
        failure_reason: reason,
        value: Sat(0),
    }
}

pub fn succeeded() -> Vec<PaymentUpdate> {
    vec![
        update(PaymentStatus::InFlight, FailureReason::None),
        update(PaymentStatus::Succeeded, FailureReason::None),
    ]
}

pub fn failed(reason: FailureReason) -> Vec<PaymentUpdate> {
    vec![update(PaymentStatus::Failed, reason)]
}

pub fn channel(id: u64, capacity: u64, local_balance: u64) -> Channel {
    Channel {
        id: ChannelId(id),
        capacity: Sat(capacity),
        local_balance: Sat(local_balance),
        active: true,
    }
}

pub fn eligible(id: u64, capacity: u64, local_balance: u64) -> EligibleChannel {
    EligibleChannel {
        id: ChannelId(id),
        local_balance_ratio: local_balance as f64 / capacity as f64,
        local_balance: Sat(local_balance),
        capacity: Sat(capacity),
    }
}

pub fn settled_invoice(amount: u64) -> Invoice {
    Invoice {
        amount_paid: Sat(amount),
        creation_time: 1_700_000_000,
        settled: true,
        hash: format!("hash-{amount}"),
    }
}

pub fn open_invoice(amount: u64) -> Invoice {
    Invoice {
        amount_paid: Sat(amount),
        creation_time: 1_700_000_000,
        settled: false,
        hash: format!("open-{amount}"),
    }
}

pub fn payout(number: usize, amount: u64) -> Payout {
    Payout {
        number,
        amount: Sat(amount),
    }
}
