use super::amount::Sat;
use super::channel::ChannelId;

/// A bolt11 payment request minted by the invoice issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bolt11(pub String);

/// One bounded-size chunk of the settled total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    /// 1-based position within the batch; display and CSV order only.
    pub number: usize,
    pub amount: Sat,
}

/// Terminal record of how one payout resolved. Never mutated once
/// recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutOutcome {
    pub payout: Payout,
    pub channel: ChannelId,
    pub succeeded: bool,
}

/// Why the orchestrator stopped walking the payout list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunHalt {
    /// Every payout in the batch was paid.
    Completed,
    /// The user declined a confirmation prompt; later payouts were not
    /// attempted.
    Aborted { payout_number: usize },
    /// A payout ran out of eligible channels; later payouts were not
    /// attempted.
    ChannelsExhausted { payout_number: usize },
}

/// Final accounting for a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutReport {
    pub outcomes: Vec<PayoutOutcome>,
    pub halt: RunHalt,
    /// Sum of every payout in the batch, paid or not.
    pub total: Sat,
}

impl PayoutReport {
    pub fn successes(&self) -> impl Iterator<Item = &PayoutOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.succeeded)
    }

    pub fn succeeded_amount(&self) -> Sat {
        self.successes().map(|outcome| outcome.payout.amount).sum()
    }
}

/// Status of an in-flight send, decoded once at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unknown,
    InFlight,
    Succeeded,
    Failed,
}

/// Why a send failed. `Timeout` is the only reason worth a retry on the
/// same channel; everything else abandons the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    None,
    Timeout,
    NoRoute,
    Error,
    IncorrectPaymentDetails,
    InsufficientBalance,
}

/// One streamed status update for an in-flight send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub failure_reason: FailureReason,
    pub value: Sat,
}
