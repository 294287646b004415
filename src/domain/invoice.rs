use super::amount::Sat;

/// An incoming invoice as reported by the node for the query window.
/// Only settled invoices contribute to the payout total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub amount_paid: Sat,
    /// Creation time as unix seconds.
    pub creation_time: i64,
    pub settled: bool,
    /// Payment hash as reported by the node, kept opaque for display.
    pub hash: String,
}

/// Total wallet balance, read once per run for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletBalance {
    pub total: Sat,
}
