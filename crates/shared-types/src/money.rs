//! # Money
//!
//! Signed currency amounts stored as integer cents (`i64`), so balance
//! comparisons are exact integer equality. A member balance of `0.00`
//! means exactly zero cents, never "close to zero".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A monetary amount in the group's home currency, stored as cents.
///
/// Serialized transparently as the cent count.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Amount from a cent count.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount from major and minor units, e.g. `(23, 30)` for 23.30.
    pub const fn from_units(major: i64, minor: i64) -> Self {
        Self(major * 100 + minor)
    }

    /// The zero amount.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// The cent count.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whether the amount is exactly zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whether the amount is strictly positive.
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Absolute value.
    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Per-head share when split between `n` recipients, truncated to the
    /// lower cent.
    ///
    /// This is the expense-splitting rule of the whole system: the share
    /// is `floor(cents / n)`, so splitting 23.30 between two people yields
    /// 11.65 and splitting 10.00 between three yields 3.33.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero; callers validate the recipient list first.
    pub const fn split_between(&self, n: u32) -> Self {
        Self(self.0.div_euclid(n as i64))
    }

    /// The cents left over after a truncated `n`-way split, in `[0, n-1]`.
    ///
    /// The split credits this remainder to no one, so a group's net
    /// balance sum can drift up to `n-1` cents per expense. That is the
    /// documented behavior, not an arithmetic bug.
    pub const fn split_remainder(&self, n: u32) -> Self {
        Self(self.0 - self.split_between(n).0 * n as i64)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|m| m.0).sum())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.0.abs() / 100, self.0.abs() % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_agree() {
        assert_eq!(Money::from_units(23, 30), Money::from_cents(2330));
        assert_eq!(Money::zero(), Money::from_cents(0));
    }

    #[test]
    fn even_split_has_no_remainder() {
        let amount = Money::from_units(23, 30);
        assert_eq!(amount.split_between(2), Money::from_cents(1165));
        assert_eq!(amount.split_remainder(2), Money::zero());
    }

    #[test]
    fn uneven_split_truncates_to_lower_cent() {
        let amount = Money::from_units(10, 0);
        assert_eq!(amount.split_between(3), Money::from_cents(333));
        assert_eq!(amount.split_remainder(3), Money::from_cents(1));
    }

    #[test]
    fn remainder_is_bounded_by_recipient_count() {
        for cents in 1..500 {
            let amount = Money::from_cents(cents);
            for n in 1..7u32 {
                let rem = amount.split_remainder(n).cents();
                assert!(rem >= 0 && rem < n as i64);
                assert_eq!(
                    amount.split_between(n).cents() * n as i64 + rem,
                    amount.cents()
                );
            }
        }
    }

    #[test]
    fn arithmetic_is_exact() {
        let mut balance = Money::zero();
        balance += Money::from_cents(2330);
        balance -= Money::from_cents(1165);
        balance -= Money::from_cents(1165);
        assert!(balance.is_zero());
        assert_eq!(-Money::from_cents(5), Money::from_cents(-5));
    }

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::from_cents(2330).to_string(), "23.30");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn serializes_as_cent_count() {
        let json = serde_json::to_string(&Money::from_cents(2330)).unwrap();
        assert_eq!(json, "2330");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(2330));
    }
}
