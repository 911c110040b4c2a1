//! Persisted portfolio positions.

use serde::{Deserialize, Serialize};

use crate::{Date, InstrumentId, Side, Strategy};

/// A single holding selected at a rebalance.
///
/// Positions are immutable once persisted; the next rebalance of the same
/// strategy supersedes them with a fresh set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Rebalance date (the Friday of the observation week).
    pub date: Date,
    /// Instrument held.
    pub instrument_id: InstrumentId,
    /// Display name.
    pub name: String,
    /// Strategy that selected the holding.
    pub strategy: Strategy,
    /// Side held on.
    pub side: Side,
    /// Strategy factor value, rounded to 4 dp.
    pub factor_value: f64,
    /// Percentile rank of the factor value in the cross-section.
    pub rank: f64,
    /// Raw window inflow, rounded to 4 dp.
    pub change_amount: f64,
}
