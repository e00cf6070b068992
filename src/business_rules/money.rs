// Fixed-point money
//
// All rule arithmetic runs on integer cents. Decimal values only appear at the
// HTTP and database boundaries.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::business_rules::error::{BRResult, BusinessRulesError};

/// Monetary amount in integer cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn new(cents: i64) -> Self {
        Cents(cents)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Convert a decimal amount, rounding half-up to whole cents
    pub fn from_decimal(amount: Decimal) -> BRResult<Self> {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (rounded * Decimal::ONE_HUNDRED)
            .to_i64()
            .map(Cents)
            .ok_or_else(|| {
                BusinessRulesError::CalculationError(format!("amount {} out of range", amount))
            })
    }

    /// Decimal representation with exactly two fractional digits
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// `percent`% of this amount, rounded half-up to cents
    pub fn percentage(self, percent: Decimal) -> BRResult<Self> {
        Cents::from_decimal(self.to_decimal() * percent / Decimal::ONE_HUNDRED)
    }

    /// Subtraction floored at zero
    pub fn saturating_sub(self, other: Cents) -> Cents {
        Cents((self.0 - other.0).max(0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl Mul<i64> for Cents {
    type Output = Cents;

    fn mul(self, rhs: i64) -> Cents {
        Cents(self.0 * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}
