//! Cumulative return recurrence.

use capflow_primitives::{Date, DiscountSet, Leg, PriorState, ReturnRecord, Side, Strategy};
use tracing::{debug, warn};

use crate::{ModelError, PricedHolding};

/// Prior recurrence state for every leg of one strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorStates {
    /// Long leg.
    pub long: PriorState,
    /// Short leg.
    pub short: PriorState,
    /// Long-short leg.
    pub long_short: PriorState,
}

impl PriorStates {
    /// State of one leg.
    #[must_use]
    pub const fn get(&self, leg: Leg) -> PriorState {
        match leg {
            Leg::Long => self.long,
            Leg::Short => self.short,
            Leg::LongShort => self.long_short,
        }
    }

    /// Replace the state of one leg.
    pub const fn set(&mut self, leg: Leg, state: PriorState) {
        match leg {
            Leg::Long => self.long = state,
            Leg::Short => self.short = state,
            Leg::LongShort => self.long_short = state,
        }
    }
}

/// Advances each leg's cumulative value for one evaluation date.
///
/// Every leg compounds from its value on the last rebalance (`initial`):
/// - long, short: `initial * raw * discount`, with `raw` the equal-weighted
///   mean gross return of the side since the rebalance
/// - long-short: `initial * (1 + (raw_long - raw_short) * discount)`
///
/// The daily return is the ratio to the leg's previous value, minus one. A leg
/// with no prior state starts from 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnCalculator;

impl ReturnCalculator {
    /// Create a calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compute return records for `strategy` on `date`.
    ///
    /// `realized` holds the positions of the last rebalance priced on that
    /// rebalance and on `date`. A side with no priced holding produces no
    /// record, and neither does the long-short leg.
    ///
    /// # Errors
    /// Returns `ModelError::NonTradingDay` if nothing could be priced.
    pub fn calculate(
        &self,
        date: Date,
        strategy: Strategy,
        realized: &[PricedHolding],
        discounts: &DiscountSet,
        priors: &PriorStates,
    ) -> Result<Vec<ReturnRecord>, ModelError> {
        if realized.is_empty() {
            return Err(ModelError::NonTradingDay(date));
        }

        let record = |leg: Leg, cumulative_value: f64| {
            let prior = priors.get(leg);
            ReturnRecord {
                date,
                strategy,
                leg,
                daily_return: cumulative_value / prior.last_value() - 1.0,
                cumulative_value,
            }
        };

        let mut records = Vec::with_capacity(3);
        let mut raw = [None, None];

        for (slot, side) in raw.iter_mut().zip(Side::BOTH) {
            let Some(mean) = mean_gross_return(realized, side) else {
                warn!(strategy = %strategy, date = %date, side = %side, "no priced holdings");
                continue;
            };
            *slot = Some(mean);

            let leg = Leg::from(side);
            let cum_ret = mean * discounts.get(leg).discount;
            records.push(record(leg, priors.get(leg).initial_value() * cum_ret));

            debug!(strategy = %strategy, leg = %leg, raw = mean, cum_ret, "leg return");
        }

        if let [Some(long), Some(short)] = raw {
            let cum_ret = (long - short) * discounts.long_short.discount;
            let initial = priors.long_short.initial_value();
            records.push(record(Leg::LongShort, initial * (1.0 + cum_ret)));

            debug!(strategy = %strategy, raw = long - short, cum_ret, "long-short return");
        }

        Ok(records)
    }
}

fn mean_gross_return(realized: &[PricedHolding], side: Side) -> Option<f64> {
    let (sum, count) = realized
        .iter()
        .filter(|h| h.side == side)
        .fold((0.0, 0usize), |(sum, count), h| (sum + h.gross_return(), count + 1));
    (count > 0).then(|| sum / count as f64)
}
