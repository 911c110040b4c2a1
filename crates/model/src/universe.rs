//! Observation window assembly and cross-section loading.

use std::collections::{HashMap, HashSet};

use capflow_factor::FactorConfig;
use capflow_primitives::{Date, InstrumentId, Observation, is_weekday};
use capflow_traits::MarketDataStore;
use chrono::Duration;
use tracing::{debug, info};

use crate::ModelError;

/// Date bounds of one rebalance's inflow aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationWindow {
    /// First calendar day of the lookback.
    pub start: Date,
    /// First trading day inside the lookback; snapshots are taken here.
    pub anchor: Date,
    /// Rebalance reference date.
    pub end: Date,
}

impl ObservationWindow {
    /// Resolve the window ending on `ref_date`.
    ///
    /// # Errors
    /// Returns `ModelError::NonTradingDay` if the lookback holds no trading day,
    /// `ModelError::InvalidConfig` if `lookback_days` does not yield a date.
    pub fn resolve<M: MarketDataStore + ?Sized>(
        market: &M,
        ref_date: Date,
        lookback_days: i64,
    ) -> Result<Self, ModelError> {
        let start = lookback_days
            .checked_sub(1)
            .filter(|days| *days >= 0)
            .and_then(Duration::try_days)
            .and_then(|span| ref_date.checked_sub_signed(span))
            .ok_or_else(|| {
                ModelError::InvalidConfig(format!(
                    "lookback of {lookback_days} days from {ref_date} is out of range"
                ))
            })?;
        let anchor = market
            .trading_days(start, ref_date)?
            .into_iter()
            .next()
            .ok_or(ModelError::NonTradingDay(ref_date))?;
        Ok(Self { start, anchor, end: ref_date })
    }
}

/// Observations for one rebalance, with the instruments barred by listing age.
#[derive(Debug, Clone)]
pub struct CrossSection {
    /// Window the observations were aggregated over.
    pub window: ObservationWindow,
    /// One row per instrument with inflow in the window.
    pub observations: Vec<Observation>,
    /// Recently listed instruments.
    pub excluded: HashSet<InstrumentId>,
}

/// Verify that inflow data covers every weekday trading day of the window.
///
/// # Errors
/// Returns `ModelError::RecordCountMismatch` if coverage is incomplete.
pub fn check_complete_records<M: MarketDataStore + ?Sized>(
    market: &M,
    window: &ObservationWindow,
) -> Result<(), ModelError> {
    let reference = market
        .trading_days(window.anchor, window.end)?
        .into_iter()
        .filter(|d| is_weekday(*d))
        .count();
    let observed = market.inflow_days(window.anchor, window.end)?.len();

    info!("Record check: {observed}/{reference} records covered.");

    if observed == reference {
        Ok(())
    } else {
        Err(ModelError::RecordCountMismatch { observed, reference })
    }
}

/// Aggregate inflow over the window ending on `ref_date` and join each
/// instrument to its anchor-day quote.
///
/// Instruments without an anchor-day quote keep no market cap or price, so the
/// market-cap filter drops them downstream.
///
/// # Errors
/// Returns `ModelError` if the window has no trading day, coverage is
/// incomplete, or a store read fails.
pub fn load_cross_section<M: MarketDataStore + ?Sized>(
    market: &M,
    ref_date: Date,
    config: &FactorConfig,
) -> Result<CrossSection, ModelError> {
    let window = ObservationWindow::resolve(market, ref_date, config.lookback_days)?;
    let excluded = market.recently_listed(ref_date, config.listing_age_days)?;

    let quotes: HashMap<InstrumentId, _> =
        market.quotes(window.anchor)?.into_iter().map(|q| (q.instrument_id, q)).collect();

    let observations: Vec<Observation> = market
        .inflow_totals(window.anchor, window.end)?
        .into_iter()
        .map(|total| {
            let quote = quotes.get(&total.instrument_id);
            Observation {
                instrument_id: total.instrument_id,
                date: ref_date,
                name: quote.map_or_else(|| total.instrument_id.to_string(), |q| q.name.clone()),
                raw_signal: total.total,
                market_cap: quote.and_then(|q| q.market_cap),
                price: quote.map(|q| q.close),
            }
        })
        .collect();

    check_complete_records(market, &window)?;

    debug!(
        anchor = %window.anchor,
        instruments = observations.len(),
        recently_listed = excluded.len(),
        "loaded cross-section"
    );

    Ok(CrossSection { window, observations, excluded })
}

#[cfg(test)]
mod tests {
    use capflow_store::MemoryMarketData;
    use capflow_traits::Quote;
    use rstest::rstest;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn quote(id: u64, close: f64, cap: Option<f64>) -> Quote {
        let instrument_id = InstrumentId::new(id);
        Quote { instrument_id, name: format!("S{id}"), close, market_cap: cap }
    }

    /// Two weeks of weekday quotes and inflows ending Friday 2022-07-08.
    fn market() -> MemoryMarketData {
        let mut market = MemoryMarketData::new();
        let mut day = d(2022, 6, 24);
        while day <= d(2022, 7, 8) {
            if is_weekday(day) {
                market.add_quote(day, quote(1, 10.0, Some(8e9)));
                market.add_quote(day, quote(2, 20.0, Some(9e9)));
                market.add_inflow(day, InstrumentId::new(1), 100.0);
                market.add_inflow(day, InstrumentId::new(2), -50.0);
            }
            day = day.succ_opt().unwrap();
        }
        market
    }

    #[test]
    fn window_anchors_on_first_trading_day() {
        let window = ObservationWindow::resolve(&market(), d(2022, 7, 8), 14).unwrap();
        assert_eq!(window.start, d(2022, 6, 25));
        assert_eq!(window.anchor, d(2022, 6, 27));
        assert_eq!(window.end, d(2022, 7, 8));
    }

    #[test]
    fn empty_window_is_non_trading() {
        let err = ObservationWindow::resolve(&market(), d(2022, 8, 20), 1).unwrap_err();
        assert!(err.is_non_trading_day());
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    #[case(i64::MAX)]
    #[case(1_000_000_000)]
    fn unrepresentable_lookback_is_invalid_config(#[case] lookback_days: i64) {
        let err = ObservationWindow::resolve(&market(), d(2022, 7, 8), lookback_days).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }

    #[test]
    fn sums_inflow_from_anchor() {
        let config = FactorConfig::default();
        let section = load_cross_section(&market(), d(2022, 7, 8), &config).unwrap();

        let first = section.observations.iter().find(|o| o.instrument_id.get() == 1).unwrap();
        assert_eq!(section.observations.len(), 2);
        assert_eq!(first.raw_signal, 1000.0);
        assert_eq!(first.market_cap, Some(8e9));
        assert_eq!(first.price, Some(10.0));
        assert_eq!(first.date, d(2022, 7, 8));
        assert!(section.excluded.is_empty());
    }

    #[test]
    fn unquoted_instrument_has_no_market_cap() {
        let mut market = market();
        market.add_inflow(d(2022, 7, 1), InstrumentId::new(3), 75.0);

        let section = load_cross_section(&market, d(2022, 7, 8), &FactorConfig::default()).unwrap();

        let third = section.observations.iter().find(|o| o.instrument_id.get() == 3).unwrap();
        assert_eq!(third.market_cap, None);
        assert_eq!(third.price, None);
    }

    #[test]
    fn recently_listed_are_reported() {
        let mut market = market();
        market.add_inflow(d(2022, 7, 5), InstrumentId::new(4), 10.0);
        let config = FactorConfig { listing_age_days: 5, ..FactorConfig::default() };

        let section = load_cross_section(&market, d(2022, 7, 8), &config).unwrap();

        assert!(section.excluded.contains(&InstrumentId::new(4)));
        assert!(!section.excluded.contains(&InstrumentId::new(1)));
    }

    #[test]
    fn missing_inflow_day_is_a_count_mismatch() {
        let mut market = MemoryMarketData::new();
        let mut day = d(2022, 6, 27);
        while day <= d(2022, 7, 8) {
            if is_weekday(day) {
                market.add_quote(day, quote(1, 10.0, Some(8e9)));
                if day != d(2022, 7, 6) {
                    market.add_inflow(day, InstrumentId::new(1), 1.0);
                }
            }
            day = day.succ_opt().unwrap();
        }

        let config = FactorConfig::default();
        let err = load_cross_section(&market, d(2022, 7, 8), &config).unwrap_err();

        assert!(matches!(err, ModelError::RecordCountMismatch { observed: 9, reference: 10 }));
    }
}
