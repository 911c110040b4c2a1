//! Market data store trait definitions.

use std::collections::{HashMap, HashSet};

use capflow_primitives::{Date, InstrumentId};

use crate::StoreError;

/// Inflow aggregated per instrument over a window.
#[derive(Debug, Clone, PartialEq)]
pub struct InflowTotal {
    /// Instrument.
    pub instrument_id: InstrumentId,
    /// Sum of inflow events.
    pub total: f64,
    /// First event date in the window.
    pub first_date: Date,
    /// Last event date in the window.
    pub last_date: Date,
}

/// End-of-day quote for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Instrument.
    pub instrument_id: InstrumentId,
    /// Display name.
    pub name: String,
    /// Close price.
    pub close: f64,
    /// Market capitalization, when published.
    pub market_cap: Option<f64>,
}

/// Read access to prices, market caps and inflow observations.
pub trait MarketDataStore {
    /// Distinct dates with quotes in `[start, end]`, ascending.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn trading_days(&self, start: Date, end: Date) -> Result<Vec<Date>, StoreError>;

    /// Distinct dates with inflow events in `[start, end]`, ascending.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn inflow_days(&self, start: Date, end: Date) -> Result<Vec<Date>, StoreError>;

    /// Inflow summed per instrument over `[start, end]`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn inflow_totals(&self, start: Date, end: Date) -> Result<Vec<InflowTotal>, StoreError>;

    /// All quotes on `date`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn quotes(&self, date: Date) -> Result<Vec<Quote>, StoreError>;

    /// Instruments whose first inflow event is on or after the
    /// `trading_days`-th most recent inflow date at or before `as_of`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn recently_listed(
        &self,
        as_of: Date,
        trading_days: usize,
    ) -> Result<HashSet<InstrumentId>, StoreError>;

    /// Close prices on `date` for `ids`; unquoted instruments are absent.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn close_prices(
        &self,
        date: Date,
        ids: &[InstrumentId],
    ) -> Result<HashMap<InstrumentId, f64>, StoreError> {
        let wanted: HashSet<InstrumentId> = ids.iter().copied().collect();
        Ok(self
            .quotes(date)?
            .into_iter()
            .filter(|q| wanted.contains(&q.instrument_id))
            .map(|q| (q.instrument_id, q.close))
            .collect())
    }
}
