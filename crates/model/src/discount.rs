//! Turnover discounts across consecutive rebalances.

use std::collections::HashSet;

use capflow_primitives::{
    Date, DiscountFactor, DiscountSet, InstrumentId, Leg, Position, Side, TransactionCosts,
};
use tracing::debug;

use crate::PricedHolding;

/// Charges transaction cost only on the capital that turns over at a
/// rebalance.
///
/// The previous portfolio's holdings are weighted by their gross return over
/// the previous holding period (equal weight at entry). A holding that is
/// still in the new portfolio, on either side, retains
/// `min(1 / new_count, gross_return / side_gross_return_sum)` of its old
/// side's capital, where `new_count` is the size of that side in the new
/// portfolio; the cap is its equal weight. With `x` the retained
/// fraction and `r` the side's one-way rate, the side's discount is
/// `(x * r + 1) / (1 + r)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountEngine {
    costs: TransactionCosts,
}

impl DiscountEngine {
    /// Create an engine with the given cost rates.
    #[must_use]
    pub const fn new(costs: TransactionCosts) -> Self {
        Self { costs }
    }

    /// Cost rates.
    #[must_use]
    pub const fn costs(&self) -> &TransactionCosts {
        &self.costs
    }

    /// Discounts for a strategy's first rebalance: all capital is newly
    /// deployed and pays the full one-way cost.
    #[must_use]
    pub fn first_rebalance(&self, rebalance_date: Date) -> DiscountSet {
        self.assemble(rebalance_date, 0.0, 0.0)
    }

    /// Discounts for the rebalance on `rebalance_date`.
    ///
    /// `previous` holds the prior rebalance's positions priced at the prior
    /// and the current rebalance date; `current` the positions selected on
    /// `rebalance_date`. Unpriced prior holdings contribute nothing.
    #[must_use]
    pub fn compute(
        &self,
        rebalance_date: Date,
        previous: &[PricedHolding],
        current: &[Position],
    ) -> DiscountSet {
        let long = retained_fraction(previous, current, Side::Long);
        let short = retained_fraction(previous, current, Side::Short);
        self.assemble(rebalance_date, long, short)
    }

    fn assemble(&self, rebalance_date: Date, long: f64, short: f64) -> DiscountSet {
        let side = |side: Side, retained: f64| {
            let rate = self.costs.rate(side);
            DiscountFactor {
                rebalance_date,
                leg: side.into(),
                retained_fraction: Some(retained),
                discount: (retained * rate + 1.0) / (1.0 + rate),
            }
        };

        let retained_cost = long * self.costs.long + short * self.costs.short;
        let long_short = DiscountFactor {
            rebalance_date,
            leg: Leg::LongShort,
            retained_fraction: None,
            discount: (retained_cost + 1.0) / (1.0 + self.costs.combined()),
        };

        let set = DiscountSet {
            long: side(Side::Long, long),
            short: side(Side::Short, short),
            long_short,
        };

        debug!(
            date = %rebalance_date,
            retained_long = long,
            retained_short = short,
            long = set.long.discount,
            short = set.short.discount,
            long_short = set.long_short.discount,
            "discounts"
        );

        set
    }
}

/// Share of one side's previous capital that stays invested across the
/// rebalance, in `[0, 1]`.
#[must_use]
fn retained_fraction(previous: &[PricedHolding], current: &[Position], side: Side) -> f64 {
    let kept: HashSet<InstrumentId> = current.iter().map(|p| p.instrument_id).collect();
    let new_count = current.iter().filter(|p| p.side == side).count();
    if new_count == 0 {
        return 0.0;
    }
    let target_weight = 1.0 / new_count as f64;

    let old: Vec<&PricedHolding> = previous
        .iter()
        .filter(|h| h.side == side && h.gross_return().is_finite())
        .collect();
    let overall: f64 = old.iter().map(|h| h.gross_return()).sum();
    if overall <= 0.0 {
        return 0.0;
    }

    old.iter()
        .filter(|h| kept.contains(&h.instrument_id))
        .map(|h| target_weight.min(h.gross_return() / overall))
        .fold(0.0, |acc, x| acc + x)
}
