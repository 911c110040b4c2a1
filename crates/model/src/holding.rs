//! Holdings joined to prices at two dates.

use capflow_primitives::{Date, InstrumentId, Position, Side};
use capflow_traits::MarketDataStore;

use crate::ModelError;

/// A held instrument priced at the start and end of a holding period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedHolding {
    /// Instrument.
    pub instrument_id: InstrumentId,
    /// Side held on.
    pub side: Side,
    /// Close at the start of the period.
    pub start_price: f64,
    /// Close at the end of the period.
    pub end_price: f64,
}

impl PricedHolding {
    /// Gross return over the period, `end_price / start_price`.
    #[must_use]
    pub fn gross_return(&self) -> f64 {
        self.end_price / self.start_price
    }
}

/// Price `positions` on `start` and `end`.
///
/// Holdings unquoted on either date, or with a non-positive start price, are
/// dropped.
///
/// # Errors
/// Returns `ModelError::Store` if a price read fails.
pub fn price_holdings<M: MarketDataStore + ?Sized>(
    market: &M,
    positions: &[Position],
    start: Date,
    end: Date,
) -> Result<Vec<PricedHolding>, ModelError> {
    let ids: Vec<InstrumentId> = positions.iter().map(|p| p.instrument_id).collect();
    let start_prices = market.close_prices(start, &ids)?;
    let end_prices = market.close_prices(end, &ids)?;

    Ok(positions
        .iter()
        .filter_map(|p| {
            let start_price = *start_prices.get(&p.instrument_id)?;
            let end_price = *end_prices.get(&p.instrument_id)?;
            (start_price > 0.0).then_some(PricedHolding {
                instrument_id: p.instrument_id,
                side: p.side,
                start_price,
                end_price,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use capflow_primitives::Strategy;
    use capflow_store::MemoryMarketData;
    use capflow_traits::Quote;

    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2022, 7, day).unwrap()
    }

    fn position(id: u64, side: Side) -> Position {
        Position {
            date: d(1),
            instrument_id: InstrumentId::new(id),
            name: format!("S{id}"),
            strategy: Strategy::Pure,
            side,
            factor_value: 0.0,
            rank: 0.5,
            change_amount: 0.0,
        }
    }

    fn quote(id: u64, close: f64) -> Quote {
        let instrument_id = InstrumentId::new(id);
        Quote { instrument_id, name: format!("S{id}"), close, market_cap: None }
    }

    #[test]
    fn joins_prices_on_both_dates() {
        let market = MemoryMarketData::new()
            .with_quote(d(1), quote(1, 10.0))
            .with_quote(d(1), quote(2, 4.0))
            .with_quote(d(1), quote(3, 7.0))
            .with_quote(d(5), quote(1, 11.0))
            .with_quote(d(5), quote(2, 3.0));

        let held = [position(1, Side::Long), position(2, Side::Short), position(3, Side::Long)];
        let priced = price_holdings(&market, &held, d(1), d(5)).unwrap();

        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].side, Side::Long);
        assert!((priced[0].gross_return() - 1.1).abs() < 1e-12);
        assert!((priced[1].gross_return() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn nothing_quoted_is_empty() {
        let market = MemoryMarketData::new().with_quote(d(1), quote(1, 10.0));
        let priced = price_holdings(&market, &[position(1, Side::Long)], d(1), d(2)).unwrap();
        assert!(priced.is_empty());
    }
}
