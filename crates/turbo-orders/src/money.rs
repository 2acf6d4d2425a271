//! Money type for representing monetary values.
//!
//! Amounts are whole currency units (Rs.) held in an `i64`. Arithmetic that
//! can overflow has a checked form; the operator impls are for call sites
//! that already bounded their inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Currency symbol used for display.
pub const CURRENCY_SYMBOL: &str = "Rs.";

/// A monetary amount in whole currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a new amount.
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// A zero amount.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// The raw amount in currency units.
    pub const fn amount(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiply by a quantity.
    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// `rate_percent` of this amount, rounded half-up to a whole unit.
    ///
    /// The rate is taken to hundredths of a percent and the product is
    /// computed in integers, so `17.5%` of `1,050` is exactly `183.75 -> 184`.
    ///
    /// ```
    /// use turbo_orders::money::Money;
    /// assert_eq!(Money::new(1000).percent_half_up(5.0), Some(Money::new(50)));
    /// assert_eq!(Money::new(10).percent_half_up(15.0), Some(Money::new(2)));
    /// ```
    pub fn percent_half_up(self, rate_percent: f64) -> Option<Money> {
        if !rate_percent.is_finite() {
            return None;
        }
        let hundredths = (rate_percent * 100.0).round();
        if hundredths.abs() > i64::MAX as f64 {
            return None;
        }
        let scaled = self.0.checked_mul(hundredths as i64)?;
        let rounded = scaled.checked_add(5_000)?.div_euclid(10_000);
        Some(Money(rounded))
    }

    /// Sum amounts, returning `None` on overflow.
    pub fn checked_sum<'a>(iter: impl IntoIterator<Item = &'a Money>) -> Option<Money> {
        iter.into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(*m))
    }

    /// Format as a display string (e.g., "Rs. 1,250").
    pub fn display(&self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{} {}", sign, CURRENCY_SYMBOL, grouped)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(0).display(), "Rs. 0");
        assert_eq!(Money::new(999).display(), "Rs. 999");
        assert_eq!(Money::new(1250).display(), "Rs. 1,250");
        assert_eq!(Money::new(1234567).display(), "Rs. 1,234,567");
        assert_eq!(Money::new(-500).display(), "-Rs. 500");
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 2.5 -> 3
        assert_eq!(Money::new(50).percent_half_up(5.0), Some(Money::new(3)));
        // 2.4 -> 2
        assert_eq!(Money::new(48).percent_half_up(5.0), Some(Money::new(2)));
        // 183.75 -> 184
        assert_eq!(Money::new(1050).percent_half_up(17.5), Some(Money::new(184)));
        assert_eq!(Money::new(1000).percent_half_up(0.0), Some(Money::zero()));
    }

    #[test]
    fn test_percent_rejects_non_finite_rates() {
        assert_eq!(Money::new(100).percent_half_up(f64::NAN), None);
        assert_eq!(Money::new(100).percent_half_up(f64::INFINITY), None);
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(Money::new(i64::MAX).checked_mul(2), None);
        assert_eq!(Money::new(3).checked_mul(4), Some(Money::new(12)));
    }

    #[test]
    fn test_checked_sum() {
        let amounts = [Money::new(100), Money::new(250), Money::new(-50)];
        assert_eq!(Money::checked_sum(&amounts), Some(Money::new(300)));
        assert_eq!(Money::checked_sum(&[Money::new(i64::MAX), Money::new(1)]), None);
    }
}
