use super::amount::Sat;
use super::channel::{Channel, ChannelId};
use super::invoice::{Invoice, WalletBalance};
use super::payout::{Bolt11, PaymentUpdate, Payout};
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// Stream of status updates for one send attempt. Runs until a terminal
/// status is observed; restartable only by issuing a new call.
pub type PaymentUpdates = BoxStream<'static, Result<PaymentUpdate>>;

/// The payment-channel node's RPC surface, as far as this tool needs it.
#[async_trait]
pub trait LedgerNode: Send + Sync {
    async fn wallet_balance(&self) -> Result<WalletBalance>;

    /// Invoices created inside `[start_unix, end_unix]`. May include
    /// unsettled invoices; callers filter on the settled flag.
    async fn list_invoices(&self, start_unix: i64, end_unix: i64) -> Result<Vec<Invoice>>;

    async fn active_channels(&self) -> Result<Vec<Channel>>;

    /// Starts a send bound to a specific outgoing channel with a
    /// per-attempt timeout.
    async fn send_payment(
        &self,
        invoice: &Bolt11,
        timeout_secs: u64,
        outgoing_channel: ChannelId,
    ) -> Result<PaymentUpdates>;
}

/// Why invoice issuance failed. `Throttled` is the only case the
/// orchestrator retries, exactly once.
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("issuer throttled the request")]
    Throttled,
    #[error("amount {amount_msat} msat outside sendable range [{min_msat}, {max_msat}]")]
    AmountOutOfRange {
        amount_msat: u64,
        min_msat: u64,
        max_msat: u64,
    },
    #[error("issuer rejected the request: {0}")]
    Rejected(String),
    #[error("issuer unreachable: {0}")]
    Transport(String),
}

/// Mints fresh bolt11 invoices for exact amounts from a static payment
/// link.
#[async_trait]
pub trait InvoiceIssuer: Send + Sync {
    async fn issue(&self, amount: Sat) -> std::result::Result<Bolt11, IssueError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Declined,
}

/// Explicit approval for each (payout, channel) attempt. A declined
/// decision aborts the whole run.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, payout: &Payout, channel: ChannelId) -> Result<Decision>;
}

pub type LedgerNodeRef = Arc<dyn LedgerNode>;
pub type InvoiceIssuerRef = Arc<dyn InvoiceIssuer>;
pub type ConfirmationGateRef = Arc<dyn ConfirmationGate>;
