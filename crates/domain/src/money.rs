//! Fixed-point money amounts.

use serde::{Deserialize, Serialize};

/// Money amount held in minor units (cents) to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a whole-unit value.
    pub fn from_units(units: i64) -> Self {
        Self {
            cents: units.saturating_mul(100),
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, saturating at the `i64` bounds.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents = self.cents.saturating_add(rhs.cents);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.units(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_from_units() {
        let money = Money::from_units(50);
        assert_eq!(money.cents(), 5000);
        assert_eq!(money.cents_part(), 0);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!(a.multiply(3).cents(), 3000);
        assert_eq!(a.multiply(0), Money::zero());
    }

    #[test]
    fn test_money_overflow_is_detected() {
        let huge = Money::from_cents(i64::MAX / 2);

        assert_eq!(huge.checked_multiply(3), None);
        assert_eq!(huge.checked_multiply(2), Some(Money::from_cents(i64::MAX - 1)));
        assert_eq!(huge.checked_add(huge.multiply(2)), None);
        assert_eq!(huge.multiply(3).cents(), i64::MAX);
        assert_eq!((huge + huge + huge).cents(), i64::MAX);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1000);

        let empty: Money = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_money_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_cents(1_500_000)).unwrap();
        assert_eq!(json, "1500000");
    }
}
