//! Factor construction configuration.

use serde::{Deserialize, Serialize};

use crate::FactorError;

/// Longest accepted inflow lookback, in calendar days.
pub const MAX_LOOKBACK_DAYS: i64 = 366;

/// Configuration for factor construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorConfig {
    /// Winsorization width in standard deviations.
    pub sig: f64,
    /// Instruments below this market cap are excluded.
    pub min_market_cap: f64,
    /// Instruments first seen within this many trading days are excluded.
    pub listing_age_days: usize,
    /// Calendar days of inflow aggregated per rebalance, ending on the
    /// reference date.
    pub lookback_days: i64,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self { sig: 3.5, min_market_cap: 5e9, listing_age_days: 60, lookback_days: 14 }
    }
}

impl FactorConfig {
    /// Check parameter ranges.
    ///
    /// # Errors
    /// Returns `FactorError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), FactorError> {
        if !(self.sig.is_finite() && self.sig > 0.0) {
            return Err(FactorError::InvalidConfig(format!(
                "sig must be positive, got {}",
                self.sig
            )));
        }
        if !(self.min_market_cap.is_finite() && self.min_market_cap >= 0.0) {
            return Err(FactorError::InvalidConfig(format!(
                "min_market_cap must be non-negative, got {}",
                self.min_market_cap
            )));
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(FactorError::InvalidConfig(format!(
                "lookback_days must be in 1..={MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn factor_config_defaults() {
        let config = FactorConfig::default();
        assert!((config.sig - 3.5).abs() < 1e-10);
        assert!((config.min_market_cap - 5e9).abs() < 1e-3);
        assert_eq!(config.listing_age_days, 60);
        assert_eq!(config.lookback_days, 14);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(FactorConfig { sig: 0.0, ..FactorConfig::default() })]
    #[case(FactorConfig { min_market_cap: -1.0, ..FactorConfig::default() })]
    #[case(FactorConfig { lookback_days: 0, ..FactorConfig::default() })]
    #[case(FactorConfig { lookback_days: MAX_LOOKBACK_DAYS + 1, ..FactorConfig::default() })]
    #[case(FactorConfig { lookback_days: i64::MAX, ..FactorConfig::default() })]
    fn invalid_configs(#[case] config: FactorConfig) {
        assert!(matches!(config.validate(), Err(FactorError::InvalidConfig(_))));
    }
}
