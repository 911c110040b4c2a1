//! Cross-sectional factor construction.

use std::collections::HashSet;

use capflow_math::{Winsorizer, correlation, standardize};
use capflow_primitives::{FactorValue, InstrumentId, Observation};
use ndarray::Array1;
use tracing::debug;

use crate::{FactorConfig, FactorError, abs_neutralize, neutralize};

/// Builds `pure`, `neu` and `absneu` factor values for one date.
///
/// Steps, each over the current cross-section only:
/// 1. drop excluded instruments and those below the market-cap floor
/// 2. winsorize and standardize the raw inflow (`pure`)
/// 3. winsorize market cap and take its log
/// 4. residualize `pure` and `|pure|` against log market cap
#[derive(Debug, Clone)]
pub struct FactorConstructor {
    config: FactorConfig,
    winsorizer: Winsorizer,
}

impl FactorConstructor {
    /// Create a constructor with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self { config: FactorConfig::default(), winsorizer: Winsorizer::default() }
    }

    /// Create a constructor with custom configuration.
    ///
    /// # Errors
    /// Returns `FactorError::InvalidConfig` if the configuration is out of range.
    pub fn with_config(config: FactorConfig) -> Result<Self, FactorError> {
        config.validate()?;
        let winsorizer = Winsorizer::new(config.sig)?;
        Ok(Self { config, winsorizer })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &FactorConfig {
        &self.config
    }

    /// Observations that survive the listing and market-cap filters.
    ///
    /// Rows without a market cap, or with a non-finite signal, are dropped.
    pub fn eligible<'a>(
        &self,
        observations: &'a [Observation],
        excluded: &HashSet<InstrumentId>,
    ) -> Vec<&'a Observation> {
        observations
            .iter()
            .filter(|o| !excluded.contains(&o.instrument_id))
            .filter(|o| o.raw_signal.is_finite())
            .filter(|o| o.market_cap.is_some_and(|cap| cap >= self.config.min_market_cap))
            .collect()
    }

    /// Construct factor values for one cross-section.
    ///
    /// # Errors
    /// Returns `FactorError::DataInsufficient` if filtering leaves fewer than
    /// two rows or the cross-section is degenerate; nothing is returned for
    /// the date in that case.
    pub fn construct(
        &self,
        observations: &[Observation],
        excluded: &HashSet<InstrumentId>,
    ) -> Result<Vec<FactorValue>, FactorError> {
        let rows = self.eligible(observations, excluded);
        let n = rows.len();

        debug!(total = observations.len(), eligible = n, "filtered cross-section");

        if n < 2 {
            return Err(FactorError::DataInsufficient { stage: "filter", required: 2, actual: n });
        }

        let raw: Array1<f64> = rows.iter().map(|o| o.raw_signal).collect();
        let caps: Array1<f64> = rows.iter().map(|o| o.market_cap.unwrap_or(f64::NAN)).collect();

        let pure = standardize(&self.winsorizer.apply(&raw)?)
            .map_err(|e| FactorError::from_math("standardize", n, e))?;
        let log_cap = self.winsorizer.apply(&caps)?.mapv(f64::ln);

        let neu = neutralize(&pure, &log_cap)?;
        let absneu = abs_neutralize(&pure, &log_cap)?;

        if let Ok(corr) = correlation(&neu, &log_cap) {
            debug!(corr, "residual correlation with log market cap");
        }

        Ok(rows
            .iter()
            .enumerate()
            .map(|(i, o)| FactorValue {
                instrument_id: o.instrument_id,
                date: o.date,
                name: o.name.clone(),
                raw_signal: o.raw_signal,
                pure: pure[i],
                neu: neu[i],
                absneu: absneu[i],
            })
            .collect())
    }
}

impl Default for FactorConstructor {
    fn default() -> Self {
        Self::new()
    }
}
