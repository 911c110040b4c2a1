//! Error types for mathematical operations.

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Invalid clipping significance.
    #[error("invalid significance: {0} (must be positive and finite)")]
    InvalidSignificance(f64),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Too few observations for the statistic.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// Linear algebra error.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Cross-section has no dispersion.
    #[error("zero variance in cross-section")]
    ZeroVariance,

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl MathError {
    /// Whether the error stems from the data being too thin rather than from
    /// a caller mistake.
    #[must_use]
    pub const fn is_data_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::ZeroVariance | Self::LinearAlgebra(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MathError::InvalidSignificance(-1.0);
        assert!(err.to_string().contains("-1"));

        let err = MathError::InsufficientData { required: 3, actual: 1 };
        assert!(err.to_string().contains('3') && err.to_string().contains('1'));
    }

    #[test]
    fn data_insufficient_classification() {
        assert!(MathError::ZeroVariance.is_data_insufficient());
        assert!(!MathError::InvalidSignificance(0.0).is_data_insufficient());
    }
}
