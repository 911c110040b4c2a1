//! Error types for the portfolio engine.

use capflow_factor::FactorError;
use capflow_math::MathError;
use capflow_primitives::Date;
use capflow_traits::StoreError;

/// Errors that can occur while selecting portfolios or computing returns.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The cross-section is too thin for regression or selection.
    #[error("insufficient data: {0}")]
    DataInsufficient(String),

    /// No holdings could be priced on the date.
    #[error("{0} is not a trading day for this portfolio")]
    NonTradingDay(Date),

    /// Upstream inflow coverage disagrees with the trading calendar.
    #[error("record count mismatch: {observed}/{reference} days covered")]
    RecordCountMismatch {
        /// Distinct inflow dates found.
        observed: usize,
        /// Weekday trading dates expected.
        reference: usize,
    },

    /// Every row of a bulk write failed.
    #[error("failed to write {failed}/{attempted} rows into table [{table}]")]
    PersistenceWrite {
        /// Table written to.
        table: &'static str,
        /// Rows that failed.
        failed: usize,
        /// Rows attempted.
        attempted: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Factor construction error.
    #[error("factor error: {0}")]
    Factor(FactorError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl From<FactorError> for ModelError {
    fn from(err: FactorError) -> Self {
        match err {
            FactorError::DataInsufficient { .. } => Self::DataInsufficient(err.to_string()),
            FactorError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            other => Self::Factor(other),
        }
    }
}

impl ModelError {
    /// Returns whether a batch job may continue with the next date or strategy.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_))
    }

    /// Returns whether the error only means the date had nothing to compute.
    #[must_use]
    pub const fn is_non_trading_day(&self) -> bool {
        matches!(self, Self::NonTradingDay(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::RecordCountMismatch { observed: 9, reference: 10 };
        assert_eq!(err.to_string(), "record count mismatch: 9/10 days covered");

        let err = ModelError::NonTradingDay(Date::from_ymd_opt(2022, 7, 9).unwrap());
        assert!(err.to_string().contains("2022-07-09"));
    }

    #[test]
    fn error_is_recoverable() {
        assert!(ModelError::DataInsufficient("empty".to_string()).is_recoverable());
        assert!(!ModelError::InvalidConfig("quantile".to_string()).is_recoverable());
    }

    #[test]
    fn factor_errors_are_classified() {
        let err: ModelError =
            FactorError::DataInsufficient { stage: "neutralize", required: 2, actual: 0 }.into();
        assert!(matches!(err, ModelError::DataInsufficient(_)));

        let err: ModelError = FactorError::InvalidConfig("sig".to_string()).into();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }
}
