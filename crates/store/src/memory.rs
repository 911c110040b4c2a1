//! In-memory stores for tests and simulations.

use std::collections::{BTreeMap, HashSet};

use capflow_primitives::{
    Date, InstrumentId, Leg, Position, ReportDocument, ReturnRecord, Strategy,
};
use capflow_traits::{
    InflowTotal, MarketDataStore, PortfolioStore, Quote, ReportingSink, StoreError,
};

use crate::validate::{check_position, check_return};

/// Quotes and inflow events held in ordered maps.
///
/// Inflow events recorded for the same instrument and date are summed.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarketData {
    quotes: BTreeMap<Date, BTreeMap<InstrumentId, Quote>>,
    inflows: BTreeMap<Date, BTreeMap<InstrumentId, f64>>,
}

impl MemoryMarketData {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a quote, replacing any quote of the instrument on `date`.
    pub fn add_quote(&mut self, date: Date, quote: Quote) {
        self.quotes.entry(date).or_default().insert(quote.instrument_id, quote);
    }

    /// Record an inflow event.
    pub fn add_inflow(&mut self, date: Date, instrument_id: InstrumentId, amount: f64) {
        *self.inflows.entry(date).or_default().entry(instrument_id).or_default() += amount;
    }

    /// Builder form of [`add_quote`](Self::add_quote).
    #[must_use]
    pub fn with_quote(mut self, date: Date, quote: Quote) -> Self {
        self.add_quote(date, quote);
        self
    }

    /// Builder form of [`add_inflow`](Self::add_inflow).
    #[must_use]
    pub fn with_inflow(mut self, date: Date, instrument_id: InstrumentId, amount: f64) -> Self {
        self.add_inflow(date, instrument_id, amount);
        self
    }
}

impl MarketDataStore for MemoryMarketData {
    fn trading_days(&self, start: Date, end: Date) -> Result<Vec<Date>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.quotes.range(start..=end).map(|(d, _)| *d).collect())
    }

    fn inflow_days(&self, start: Date, end: Date) -> Result<Vec<Date>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.inflows.range(start..=end).map(|(d, _)| *d).collect())
    }

    fn inflow_totals(&self, start: Date, end: Date) -> Result<Vec<InflowTotal>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }

        let mut totals: BTreeMap<InstrumentId, InflowTotal> = BTreeMap::new();
        for (date, events) in self.inflows.range(start..=end) {
            for (id, amount) in events {
                totals
                    .entry(*id)
                    .and_modify(|t| {
                        t.total += amount;
                        t.last_date = *date;
                    })
                    .or_insert(InflowTotal {
                        instrument_id: *id,
                        total: *amount,
                        first_date: *date,
                        last_date: *date,
                    });
            }
        }
        Ok(totals.into_values().collect())
    }

    fn quotes(&self, date: Date) -> Result<Vec<Quote>, StoreError> {
        Ok(self.quotes.get(&date).map(|q| q.values().cloned().collect()).unwrap_or_default())
    }

    fn recently_listed(
        &self,
        as_of: Date,
        trading_days: usize,
    ) -> Result<HashSet<InstrumentId>, StoreError> {
        let Some(cutoff) = trading_days
            .checked_sub(1)
            .and_then(|n| self.inflows.range(..=as_of).map(|(d, _)| *d).rev().nth(n))
        else {
            return Ok(HashSet::new());
        };

        let mut seen = HashSet::new();
        let mut recent = HashSet::new();
        for (date, events) in self.inflows.range(..=as_of) {
            for id in events.keys() {
                if seen.insert(*id) && *date >= cutoff {
                    recent.insert(*id);
                }
            }
        }
        Ok(recent)
    }
}

/// Positions and return records keyed the way the SQL tables are.
#[derive(Debug, Clone, Default)]
pub struct MemoryPortfolioStore {
    positions: BTreeMap<(Date, Strategy, InstrumentId), Position>,
    returns: BTreeMap<(Date, Strategy, Leg), ReturnRecord>,
}

impl MemoryPortfolioStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored position, ordered by date, strategy and instrument.
    pub fn all_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Every stored return record, ordered by date, strategy and leg.
    pub fn all_returns(&self) -> impl Iterator<Item = &ReturnRecord> {
        self.returns.values()
    }
}

impl PortfolioStore for MemoryPortfolioStore {
    fn upsert_position(&mut self, position: &Position) -> Result<(), StoreError> {
        check_position(position)?;
        let key = (position.date, position.strategy, position.instrument_id);
        self.positions.insert(key, position.clone());
        Ok(())
    }

    fn upsert_return(&mut self, record: &ReturnRecord) -> Result<(), StoreError> {
        check_return(record)?;
        self.returns.insert((record.date, record.strategy, record.leg), *record);
        Ok(())
    }

    fn positions(&self, strategy: Strategy, date: Date) -> Result<Vec<Position>, StoreError> {
        let mut held: Vec<Position> = self
            .positions
            .values()
            .filter(|p| p.date == date && p.strategy == strategy)
            .cloned()
            .collect();
        held.sort_by(|a, b| a.rank.total_cmp(&b.rank));
        Ok(held)
    }

    fn last_rebalance_before(
        &self,
        strategy: Strategy,
        before: Date,
    ) -> Result<Option<Date>, StoreError> {
        Ok(self
            .positions
            .keys()
            .rev()
            .find(|(date, s, _)| *s == strategy && *date < before)
            .map(|(date, _, _)| *date))
    }

    fn return_on(
        &self,
        strategy: Strategy,
        leg: Leg,
        date: Date,
    ) -> Result<Option<ReturnRecord>, StoreError> {
        Ok(self.returns.get(&(date, strategy, leg)).copied())
    }

    fn last_return_before(
        &self,
        strategy: Strategy,
        leg: Leg,
        before: Date,
    ) -> Result<Option<ReturnRecord>, StoreError> {
        Ok(self
            .returns
            .values()
            .rev()
            .find(|r| r.strategy == strategy && r.leg == leg && r.date < before)
            .copied())
    }
}

/// Collects published documents in order.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportingSink {
    documents: Vec<ReportDocument>,
}

impl MemoryReportingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents published so far.
    #[must_use]
    pub fn documents(&self) -> &[ReportDocument] {
        &self.documents
    }

    /// Documents published to one collection.
    pub fn collection<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ReportDocument> + 'a {
        self.documents.iter().filter(move |d| d.collection() == name)
    }
}

impl ReportingSink for MemoryReportingSink {
    fn publish(&mut self, document: &ReportDocument) -> Result<String, StoreError> {
        self.documents.push(document.clone());
        Ok(self.documents.len().to_string())
    }
}
