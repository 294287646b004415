use super::amount::Sat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a payment channel, unique within one snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One outgoing channel as reported by the node. Read-only snapshot data;
/// the node is queried once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub capacity: Sat,
    pub local_balance: Sat,
    pub active: bool,
}

/// A channel that passed the eligibility filter, annotated with its
/// local-balance ratio (spendable local balance / capacity).
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleChannel {
    pub id: ChannelId,
    pub local_balance_ratio: f64,
    pub local_balance: Sat,
    pub capacity: Sat,
}

/// Filters `channels` down to those that can plausibly route `probe`
/// satoshis and orders them by liquidity preference.
///
/// A channel is eligible when it is active, its local balance covers the
/// probe amount, and its local-balance ratio is strictly above
/// `preferred_ratio`. The result is sorted descending by ratio; channels
/// with equal ratios keep their input order.
pub fn rank(channels: &[Channel], probe: Sat, preferred_ratio: f64) -> Vec<EligibleChannel> {
    let mut eligible: Vec<EligibleChannel> = channels
        .iter()
        .filter(|channel| channel.active && channel.local_balance >= probe)
        .filter_map(|channel| {
            let ratio = channel.local_balance.0 as f64 / channel.capacity.0 as f64;
            (ratio > preferred_ratio).then(|| EligibleChannel {
                id: channel.id,
                local_balance_ratio: ratio,
                local_balance: channel.local_balance,
                capacity: channel.capacity,
            })
        })
        .collect();

    // Stable sort keeps ties in input order.
    eligible.sort_by(|a, b| b.local_balance_ratio.total_cmp(&a.local_balance_ratio));
    eligible
}
