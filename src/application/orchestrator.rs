use crate::domain::amount::Sat;
use crate::domain::channel::{ChannelId, EligibleChannel};
use crate::domain::payout::{
    Bolt11, FailureReason, PaymentStatus, Payout, PayoutOutcome, PayoutReport, RunHalt,
};
use crate::domain::ports::{
    ConfirmationGateRef, Decision, InvoiceIssuerRef, IssueError, LedgerNodeRef,
};
use crate::error::Result;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Fixed pause before a retry after a timed-out send attempt, and before
/// the single issuance retry after a throttled response.
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Per-payout progress through the attempt loop.
enum PayoutState {
    PendingInvoice,
    AwaitingSend(Bolt11),
    Succeeded(ChannelId),
    Exhausted,
}

/// How walking the ranked channel list resolved for one payout.
enum SendOutcome {
    Paid(ChannelId),
    Declined,
    Exhausted { last_channel: Option<ChannelId> },
}

/// How one channel's attempt loop resolved.
enum ChannelResolution {
    Succeeded,
    /// Non-timeout failure; the channel is abandoned at once.
    Failed(FailureReason),
    /// `max_retries` attempts ended in timeouts.
    RetriesExhausted,
}

/// Drives each payout through invoice issuance and channel-ordered send
/// attempts, strictly sequentially, and owns the outcome ledger.
///
/// The per-payout state machine is
/// `PendingInvoice -> AwaitingSend -> {Succeeded, Exhausted}`. The first
/// exhausted payout halts the run; later payouts are never attempted.
pub struct PayoutOrchestrator {
    node: LedgerNodeRef,
    issuer: InvoiceIssuerRef,
    gate: ConfirmationGateRef,
    timeout_secs: u64,
    max_retries: u32,
}

impl PayoutOrchestrator {
    pub fn new(
        node: LedgerNodeRef,
        issuer: InvoiceIssuerRef,
        gate: ConfirmationGateRef,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Self {
        Self {
            node,
            issuer,
            gate,
            timeout_secs,
            max_retries,
        }
    }

    /// Processes `payouts` in list order against the ranked channel
    /// preference list and returns the outcome ledger with the halt
    /// reason. Issuance failures are the only error path that aborts the
    /// run without a report.
    pub async fn run(
        &self,
        payouts: &[Payout],
        channels: &[EligibleChannel],
    ) -> Result<PayoutReport> {
        let total: Sat = payouts.iter().map(|p| p.amount).sum();
        let mut outcomes = Vec::new();

        for payout in payouts {
            let mut state = PayoutState::PendingInvoice;
            loop {
                state = match state {
                    PayoutState::PendingInvoice => {
                        PayoutState::AwaitingSend(self.issue_invoice(payout).await?)
                    }
                    PayoutState::AwaitingSend(invoice) => {
                        match self.try_channels(payout, &invoice, channels).await? {
                            SendOutcome::Paid(channel) => PayoutState::Succeeded(channel),
                            SendOutcome::Declined => {
                                info!(payout = payout.number, "user declined; aborting run");
                                return Ok(PayoutReport {
                                    outcomes,
                                    halt: RunHalt::Aborted {
                                        payout_number: payout.number,
                                    },
                                    total,
                                });
                            }
                            SendOutcome::Exhausted { last_channel } => {
                                if let Some(channel) = last_channel {
                                    outcomes.push(PayoutOutcome {
                                        payout: *payout,
                                        channel,
                                        succeeded: false,
                                    });
                                }
                                PayoutState::Exhausted
                            }
                        }
                    }
                    PayoutState::Succeeded(channel) => {
                        outcomes.push(PayoutOutcome {
                            payout: *payout,
                            channel,
                            succeeded: true,
                        });
                        break;
                    }
                    PayoutState::Exhausted => {
                        warn!(
                            payout = payout.number,
                            "all eligible channels exhausted; halting run"
                        );
                        return Ok(PayoutReport {
                            outcomes,
                            halt: RunHalt::ChannelsExhausted {
                                payout_number: payout.number,
                            },
                            total,
                        });
                    }
                };
            }
        }

        Ok(PayoutReport {
            outcomes,
            halt: RunHalt::Completed,
            total,
        })
    }

    /// Requests a fresh invoice for the payout's exact amount. A
    /// throttled response is retried exactly once after a fixed pause;
    /// any other failure, or a second throttle, is fatal to the run.
    async fn issue_invoice(&self, payout: &Payout) -> Result<Bolt11> {
        match self.issuer.issue(payout.amount).await {
            Ok(invoice) => Ok(invoice),
            Err(IssueError::Throttled) => {
                warn!(
                    payout = payout.number,
                    "issuer throttled the request; retrying once in {}s",
                    RETRY_BACKOFF.as_secs()
                );
                sleep(RETRY_BACKOFF).await;
                self.issuer.issue(payout.amount).await.map_err(Into::into)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Walks the ranked channel list for one payout, asking the
    /// confirmation gate before each channel.
    async fn try_channels(
        &self,
        payout: &Payout,
        invoice: &Bolt11,
        channels: &[EligibleChannel],
    ) -> Result<SendOutcome> {
        let mut last_channel = None;

        for channel in channels {
            if self.gate.confirm(payout, channel.id).await? == Decision::Declined {
                return Ok(SendOutcome::Declined);
            }

            last_channel = Some(channel.id);
            match self.send_through(invoice, channel.id).await? {
                ChannelResolution::Succeeded => return Ok(SendOutcome::Paid(channel.id)),
                ChannelResolution::Failed(reason) => {
                    info!(
                        channel = %channel.id,
                        ?reason,
                        "send failed; trying next eligible channel"
                    );
                }
                ChannelResolution::RetriesExhausted => {
                    info!(
                        channel = %channel.id,
                        "retries exhausted; trying next eligible channel"
                    );
                }
            }
        }

        Ok(SendOutcome::Exhausted { last_channel })
    }

    /// Attempts a send through one channel up to `max_retries` times.
    /// Each attempt observes the update stream until a terminal status:
    /// success ends the loop, a timeout consumes a retry after a fixed
    /// pause, and any other failure abandons the channel.
    async fn send_through(
        &self,
        invoice: &Bolt11,
        channel: ChannelId,
    ) -> Result<ChannelResolution> {
        for attempt in 1..=self.max_retries {
            info!(%channel, attempt, "attempting to pay invoice");

            let mut updates = self
                .node
                .send_payment(invoice, self.timeout_secs, channel)
                .await?;

            let mut timed_out = false;
            while let Some(update) = updates.next().await {
                let update = update?;
                match update.status {
                    PaymentStatus::Succeeded => {
                        info!(%channel, value = %update.value, "payment sent successfully");
                        return Ok(ChannelResolution::Succeeded);
                    }
                    PaymentStatus::Failed
                        if update.failure_reason == FailureReason::Timeout =>
                    {
                        warn!(%channel, attempt, "payment attempt timed out");
                        timed_out = true;
                        break;
                    }
                    PaymentStatus::Failed => {
                        return Ok(ChannelResolution::Failed(update.failure_reason));
                    }
                    PaymentStatus::Unknown | PaymentStatus::InFlight => {}
                }
            }

            if !timed_out {
                // The stream ended without a terminal status; treat it
                // like any other non-timeout failure.
                return Ok(ChannelResolution::Failed(FailureReason::Error));
            }

            if attempt < self.max_retries {
                sleep(RETRY_BACKOFF).await;
            }
        }

        Ok(ChannelResolution::RetriesExhausted)
    }
}
