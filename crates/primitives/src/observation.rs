//! Cross-sectional observation and factor value types.

use serde::{Deserialize, Serialize};

use crate::{Date, InstrumentId, Strategy};

/// One instrument's aggregated inflow over a rebalance window, joined to its
/// price and market-cap snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Instrument.
    pub instrument_id: InstrumentId,
    /// Rebalance reference date.
    pub date: Date,
    /// Display name used in published snapshots.
    pub name: String,
    /// Net inflow summed over the window.
    pub raw_signal: f64,
    /// Market capitalization on the window's anchor day, if quoted.
    pub market_cap: Option<f64>,
    /// Close price on the window's anchor day, if quoted.
    pub price: Option<f64>,
}

impl Observation {
    /// Create a fully quoted observation.
    #[must_use]
    pub fn new(
        instrument_id: InstrumentId,
        date: Date,
        name: impl Into<String>,
        raw_signal: f64,
        market_cap: f64,
        price: f64,
    ) -> Self {
        Self {
            instrument_id,
            date,
            name: name.into(),
            raw_signal,
            market_cap: Some(market_cap),
            price: Some(price),
        }
    }
}

/// Constructed factor values for one instrument on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorValue {
    /// Instrument.
    pub instrument_id: InstrumentId,
    /// Rebalance reference date.
    pub date: Date,
    /// Display name.
    pub name: String,
    /// Untransformed window inflow.
    pub raw_signal: f64,
    /// Winsorized and standardized inflow.
    pub pure: f64,
    /// `pure` residualized against log market cap.
    pub neu: f64,
    /// `|pure|` residualized against log market cap, re-signed by `pure`.
    pub absneu: f64,
}

impl FactorValue {
    /// Value of the column a strategy ranks on.
    #[must_use]
    pub const fn get(&self, strategy: Strategy) -> f64 {
        match strategy {
            Strategy::Pure => self.pure,
            Strategy::Neu => self.neu,
            Strategy::Absneu => self.absneu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_value_column_lookup() {
        let fv = FactorValue {
            instrument_id: InstrumentId::new(1),
            date: Date::from_ymd_opt(2022, 7, 1).unwrap(),
            name: "A".to_string(),
            raw_signal: 10.0,
            pure: 1.0,
            neu: 2.0,
            absneu: -3.0,
        };
        assert_eq!(fv.get(Strategy::Pure), 1.0);
        assert_eq!(fv.get(Strategy::Neu), 2.0);
        assert_eq!(fv.get(Strategy::Absneu), -3.0);
    }
}
