//! Error types for factor construction.

use capflow_math::MathError;

/// Errors that can occur while constructing factor values.
#[derive(Debug, thiserror::Error)]
pub enum FactorError {
    /// Too few usable rows for a construction step.
    #[error("insufficient data for {stage}: need at least {required} rows, got {actual}")]
    DataInsufficient {
        /// Step that could not proceed.
        stage: &'static str,
        /// Required number of rows.
        required: usize,
        /// Rows available.
        actual: usize,
    },

    /// Math operation error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FactorError {
    /// Classify a math failure raised while fitting `stage` on `rows` rows.
    #[must_use]
    pub(crate) fn from_math(stage: &'static str, rows: usize, err: MathError) -> Self {
        if err.is_data_insufficient() {
            Self::DataInsufficient { stage, required: 2, actual: rows }
        } else {
            Self::Math(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FactorError::DataInsufficient { stage: "neutralize", required: 2, actual: 0 };
        assert_eq!(
            err.to_string(),
            "insufficient data for neutralize: need at least 2 rows, got 0"
        );
    }

    #[test]
    fn zero_variance_is_data_insufficient() {
        let err = FactorError::from_math("standardize", 4, MathError::ZeroVariance);
        assert!(matches!(err, FactorError::DataInsufficient { actual: 4, .. }));

        let err = FactorError::from_math("winsorize", 4, MathError::InvalidSignificance(0.0));
        assert!(matches!(err, FactorError::Math(_)));
    }
}
