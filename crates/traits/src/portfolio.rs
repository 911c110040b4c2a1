//! Portfolio store trait definitions.

use capflow_primitives::{Date, Leg, Position, ReturnRecord, Strategy};

use crate::{StoreError, WriteReport};

/// Read/write access to persisted positions and return records.
///
/// Positions are keyed by `(date, instrument_id, strategy)` and returns by
/// `(date, strategy, leg)`; writing an existing key replaces the row.
pub trait PortfolioStore {
    /// Insert or replace one position.
    ///
    /// # Errors
    /// Returns `StoreError` if the row cannot be written.
    fn upsert_position(&mut self, position: &Position) -> Result<(), StoreError>;

    /// Insert or replace one return record.
    ///
    /// # Errors
    /// Returns `StoreError` if the row cannot be written.
    fn upsert_return(&mut self, record: &ReturnRecord) -> Result<(), StoreError>;

    /// Positions of `strategy` selected at the rebalance on `date`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn positions(&self, strategy: Strategy, date: Date) -> Result<Vec<Position>, StoreError>;

    /// Latest rebalance date of `strategy` strictly before `before`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn last_rebalance_before(
        &self,
        strategy: Strategy,
        before: Date,
    ) -> Result<Option<Date>, StoreError>;

    /// Return record of a leg on exactly `date`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn return_on(
        &self,
        strategy: Strategy,
        leg: Leg,
        date: Date,
    ) -> Result<Option<ReturnRecord>, StoreError>;

    /// Most recent return record of a leg strictly before `before`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend read fails.
    fn last_return_before(
        &self,
        strategy: Strategy,
        leg: Leg,
        before: Date,
    ) -> Result<Option<ReturnRecord>, StoreError>;

    /// Upsert positions row by row, collecting every outcome.
    fn upsert_positions(&mut self, positions: &[Position]) -> WriteReport {
        let rows = positions.iter().map(|p| self.upsert_position(p)).collect();
        WriteReport::new("positions", rows)
    }

    /// Upsert return records row by row, collecting every outcome.
    fn upsert_returns(&mut self, records: &[ReturnRecord]) -> WriteReport {
        let rows = records.iter().map(|r| self.upsert_return(r)).collect();
        WriteReport::new("returns", rows)
    }
}
