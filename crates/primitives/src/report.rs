//! Documents published to the reporting sink.

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::Date;

/// Top constituents of a published portfolio at its last rebalance.
///
/// Serializes flat, as `constituent_1..N` / `weighting_1..N` keys.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    /// Report identifier.
    pub id: u32,
    /// Published portfolio name.
    pub name: String,
    /// Rebalance the snapshot reflects.
    pub last_rebalance_date: Date,
    /// `(name, weight in percent)` pairs, at most ten.
    pub constituents: Vec<(String, f64)>,
}

impl Serialize for PortfolioSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + 2 * self.constituents.len()))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("last_rebalance_date", &self.last_rebalance_date)?;
        for (i, (name, _)) in self.constituents.iter().enumerate() {
            map.serialize_entry(&format!("constituent_{}", i + 1), name)?;
        }
        for (i, (_, weight)) in self.constituents.iter().enumerate() {
            map.serialize_entry(&format!("weighting_{}", i + 1), weight)?;
        }
        map.end()
    }
}

/// Daily performance of a published portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceUpdate {
    /// Evaluation date.
    pub trading_date: Date,
    /// Report identifier.
    pub portfolio_id: f64,
    /// Published portfolio name.
    pub portfolio_name: String,
    /// Daily return in percent, rounded to 4 dp.
    pub daily_return: f64,
    /// Cumulative value, rounded to 4 dp.
    pub cumulative_value: f64,
}

/// Any document accepted by the reporting sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportDocument {
    /// Constituent snapshot.
    Snapshot(PortfolioSnapshot),
    /// Performance update.
    Performance(PerformanceUpdate),
}

impl ReportDocument {
    /// Collection the document belongs to.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "portfolio_detail",
            Self::Performance(_) => "portfolio_performance",
        }
    }
}
