use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// An amount in satoshis.
///
/// This is a wrapper around `u64` to keep satoshi and millisatoshi
/// quantities from being mixed up at API boundaries. All payout
/// arithmetic is exact integer arithmetic on this type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Sat(pub u64);

impl Sat {
    pub const ZERO: Self = Self(0);

    /// The value in millisatoshis, the unit LNURL services quote in.
    pub fn msat(self) -> u64 {
        self.0 * 1000
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Sat {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Sat {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Sat {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Sat {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Sat {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|s| s.0).sum())
    }
}

impl<'a> Sum<&'a Sat> for Sat {
    fn sum<I: Iterator<Item = &'a Sat>>(iter: I) -> Self {
        Self(iter.map(|s| s.0).sum())
    }
}
