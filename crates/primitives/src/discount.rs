//! Transaction-cost and turnover discount types.

use serde::{Deserialize, Serialize};

use crate::{Date, Leg, Side};

/// One-way transaction-cost rates per side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionCosts {
    /// Long side rate (e.g. 0.002 = 20bp).
    pub long: f64,
    /// Short side rate.
    pub short: f64,
}

impl TransactionCosts {
    /// Create cost rates.
    #[must_use]
    pub const fn new(long: f64, short: f64) -> Self {
        Self { long, short }
    }

    /// Rate for a side.
    #[must_use]
    pub const fn rate(&self, side: Side) -> f64 {
        match side {
            Side::Long => self.long,
            Side::Short => self.short,
        }
    }

    /// Combined rate charged on the long-short book.
    #[must_use]
    pub fn combined(&self) -> f64 {
        self.long + self.short
    }
}

impl Default for TransactionCosts {
    fn default() -> Self {
        Self { long: 0.002, short: 0.003 }
    }
}

/// Turnover discount for one leg at one rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountFactor {
    /// Rebalance the discount applies from.
    pub rebalance_date: Date,
    /// Leg the discount applies to.
    pub leg: Leg,
    /// Share of prior capital kept across the rebalance. `None` for the
    /// long-short leg, which combines both sides' retained capital.
    pub retained_fraction: Option<f64>,
    /// Multiplicative adjustment to the leg's raw return, in `(0, 1]`.
    pub discount: f64,
}

/// Discounts for every leg of a strategy at one rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountSet {
    /// Long side.
    pub long: DiscountFactor,
    /// Short side.
    pub short: DiscountFactor,
    /// Netted long-short book.
    pub long_short: DiscountFactor,
}

impl DiscountSet {
    /// Discount for a leg.
    #[must_use]
    pub const fn get(&self, leg: Leg) -> &DiscountFactor {
        match leg {
            Leg::Long => &self.long,
            Leg::Short => &self.short,
            Leg::LongShort => &self.long_short,
        }
    }

    /// Rebalance date shared by all legs.
    #[must_use]
    pub const fn rebalance_date(&self) -> Date {
        self.long.rebalance_date
    }
}
