//! Money amounts in minor currency units.
//!
//! The remote cart reports every price as an integer number of cents.
//! Formatting goes through [`Decimal`] so no float rounding can leak into
//! displayed prices.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money in minor currency units (e.g., cents).
///
/// ## Examples
///
/// ```
/// use cart_drawer_core::Money;
///
/// assert_eq!(Money::from_cents(0).display(), "$0.00");
/// assert_eq!(Money::from_cents(199).display(), "$1.99");
/// assert_eq!(Money::from_cents(100_000).display(), "$1000.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// A zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor currency units.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Get the amount in minor currency units.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Get the amount in major units as an exact decimal.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }

    /// Format for display (e.g., "$19.99").
    ///
    /// Fixed dollar sign, two decimals, no thousands separators.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.amount())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<u64> for Money {
    fn from(cents: u64) -> Self {
        Self(cents)
    }
}

/// Format an amount of minor currency units as a price string.
#[must_use]
pub fn format_money(cents: u64) -> String {
    Money::from_cents(cents).display()
}
