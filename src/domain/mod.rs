pub mod amount;
pub mod channel;
pub mod invoice;
pub mod payout;
pub mod ports;
pub mod split;
