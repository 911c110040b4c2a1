//! Quantile portfolio selection.

use capflow_math::percentile_rank_xsection;
use capflow_primitives::{
    Date, FactorValue, InstrumentId, Position, Side, Strategy, friday_of_week, round_to,
};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::{ModelError, SelectionConfig};

/// Long and short holdings chosen for one strategy at one rebalance.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Rebalance date (Friday of the reference week).
    pub date: Date,
    /// Strategy selected for.
    pub strategy: Strategy,
    /// Top-quantile holdings, ascending by rank.
    pub long: Vec<Position>,
    /// Bottom-quantile holdings, ascending by rank.
    pub short: Vec<Position>,
    /// Instruments ranked.
    pub universe_size: usize,
}

impl Selection {
    /// Holdings on one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &[Position] {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
        }
    }

    /// Total holdings across both sides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.long.len() + self.short.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.long.is_empty() && self.short.is_empty()
    }

    /// All holdings, long first.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.long.iter().chain(self.short.iter())
    }
}

/// Picks the top and bottom quantiles of a factor column.
///
/// Ranks are cross-sectional percentiles with ties sharing their average
/// rank. The long side holds `rank >= 1 - q`, the short side `rank <= q`; at
/// `q = 0.5` an instrument ranked exactly at the midpoint is held short only,
/// so the two sides never overlap.
#[derive(Debug, Clone)]
pub struct PortfolioSelector {
    quantile: f64,
    min_viable: usize,
}

impl PortfolioSelector {
    /// Create a selector with the default quantile (5%).
    #[must_use]
    pub fn new() -> Self {
        let config = SelectionConfig::default();
        Self { quantile: config.quantile, min_viable: config.min_viable }
    }

    /// Create a selector from configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` unless `0 < quantile <= 0.5`.
    pub fn with_config(config: &SelectionConfig) -> Result<Self, ModelError> {
        if !(config.quantile > 0.0 && config.quantile <= 0.5) {
            return Err(ModelError::InvalidConfig(format!(
                "quantile must be in (0, 0.5], got {}",
                config.quantile
            )));
        }
        Ok(Self { quantile: config.quantile, min_viable: config.min_viable })
    }

    /// Share of the cross-section held per side.
    #[must_use]
    pub const fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Select holdings for `strategy` from the factor values of `ref_date`.
    ///
    /// A universe smaller than the configured minimum still yields a
    /// selection, logged as undersized.
    ///
    /// # Errors
    /// Returns `ModelError::DataInsufficient` for an empty cross-section.
    pub fn select(
        &self,
        ref_date: Date,
        strategy: Strategy,
        values: &[FactorValue],
    ) -> Result<Selection, ModelError> {
        if values.is_empty() {
            return Err(ModelError::DataInsufficient(format!(
                "no factor values to rank for {strategy} on {ref_date}"
            )));
        }

        let n = values.len();
        let frame = df! {
            "date" => vec![ref_date.to_string(); n],
            "instrument_id" => values.iter().map(|v| v.instrument_id.get()).collect::<Vec<u64>>(),
            "name" => values.iter().map(|v| v.name.as_str()).collect::<Vec<&str>>(),
            "raw_signal" => values.iter().map(|v| v.raw_signal).collect::<Vec<f64>>(),
            "factor" => values.iter().map(|v| v.get(strategy)).collect::<Vec<f64>>(),
        }?;

        let ranked = frame
            .lazy()
            .with_column(percentile_rank_xsection("factor", "date").alias("rank"))
            .collect()?;

        let q = self.quantile;
        let date = friday_of_week(ref_date);
        let short = extract_side(&ranked, col("rank").lt_eq(lit(q)), date, strategy, Side::Short)?;
        let long = extract_side(
            &ranked,
            col("rank").gt_eq(lit(1.0 - q)).and(col("rank").gt(lit(q))),
            date,
            strategy,
            Side::Long,
        )?;

        if n < self.min_viable {
            warn!(
                strategy = %strategy,
                universe = n,
                min_viable = self.min_viable,
                "cross-section below minimum viable size, portfolio will be undersized"
            );
        }
        debug!(strategy = %strategy, long = long.len(), short = short.len(), "selected");

        Ok(Selection { date, strategy, long, short, universe_size: n })
    }
}

impl Default for PortfolioSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_side(
    ranked: &DataFrame,
    predicate: Expr,
    date: Date,
    strategy: Strategy,
    side: Side,
) -> Result<Vec<Position>, ModelError> {
    let picked = ranked
        .clone()
        .lazy()
        .filter(predicate)
        .sort(["rank"], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?;

    let ids = picked.column("instrument_id")?.u64()?;
    let names = picked.column("name")?.str()?;
    let raw = picked.column("raw_signal")?.f64()?;
    let factor = picked.column("factor")?.f64()?;
    let rank = picked.column("rank")?.f64()?;

    (0..picked.height())
        .map(|i| {
            let row = (ids.get(i), names.get(i), raw.get(i), factor.get(i), rank.get(i));
            let (Some(id), Some(name), Some(raw), Some(factor), Some(rank)) = row else {
                return Err(ModelError::DataInsufficient(format!(
                    "null in ranked cross-section at row {i}"
                )));
            };
            Ok(Position {
                date,
                instrument_id: InstrumentId::new(id),
                name: name.to_string(),
                strategy,
                side,
                factor_value: round_to(factor, 4),
                rank,
                change_amount: round_to(raw, 4),
            })
        })
        .collect()
}
