use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

/// Default number of fractional digits in reported money and percentages.
pub const DISPLAY_SCALE: u32 = 4;

/// A reported figure together with a data-completeness flag.
///
/// Inside the engine a missing fixing is `None`. At the reporting edge it is
/// coerced to zero for compatibility, and `complete` tells a true zero apart
/// from "no data available".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub amount: Decimal,
    pub complete: bool,
}

impl Valuation {
    pub const ZERO: Valuation = Valuation {
        amount: Decimal::ZERO,
        complete: true,
    };

    pub fn available(amount: Decimal) -> Self {
        Self {
            amount,
            complete: true,
        }
    }

    /// Zero-coerced placeholder for a value that could not be computed.
    pub fn missing() -> Self {
        Self {
            amount: Decimal::ZERO,
            complete: false,
        }
    }

    pub fn from_option(value: Option<Decimal>) -> Self {
        value.map_or_else(Self::missing, Self::available)
    }

    /// The amount, or `None` if any contributing fixing was missing.
    pub fn as_option(&self) -> Option<Decimal> {
        self.complete.then_some(self.amount)
    }

    /// Round the amount for display, keeping the completeness flag.
    pub fn rounded(&self, scale: u32) -> Self {
        Self {
            amount: round_money(self.amount, scale),
            complete: self.complete,
        }
    }
}

impl Default for Valuation {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Valuation {
    type Output = Valuation;

    fn add(self, rhs: Valuation) -> Valuation {
        Valuation {
            amount: self.amount + rhs.amount,
            complete: self.complete && rhs.complete,
        }
    }
}

impl Sum for Valuation {
    fn sum<I: Iterator<Item = Valuation>>(iter: I) -> Self {
        iter.fold(Valuation::ZERO, Add::add)
    }
}

impl From<Option<Decimal>> for Valuation {
    fn from(value: Option<Decimal>) -> Self {
        Self::from_option(value)
    }
}

/// Round half away from zero to `scale` digits and strip trailing zeros.
pub fn round_money(value: Decimal, scale: u32) -> Decimal {
    value
        .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// `(current - previous) / previous * 100`; `None` when `previous` is zero.
pub fn percent_change(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    (current - previous)
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
