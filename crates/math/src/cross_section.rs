//! Cross-sectional statistical operations.

use ndarray::Array1;
use polars::prelude::*;

use crate::MathError;

/// Mean and population standard deviation over the finite entries.
///
/// Returns `None` when there are no finite entries.
#[must_use]
pub fn mean_std(data: &Array1<f64>) -> Option<(f64, f64)> {
    let finite: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    Some((mean, variance.sqrt()))
}

/// Z-score a cross-section with its own mean and population standard deviation.
///
/// # Errors
/// Returns `MathError::ZeroVariance` if every finite value is identical.
pub fn standardize(data: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let Some((mean, std)) = mean_std(data) else {
        return Ok(data.clone());
    };

    if std <= f64::EPSILON * mean.abs().max(1.0) {
        return Err(MathError::ZeroVariance);
    }

    Ok(data.mapv(|x| (x - mean) / std))
}

/// Cross-sectional percentile rank of a column partitioned by group.
///
/// Ties share their average rank; the result is `rank / count`, so the
/// largest value maps to 1 and the smallest to `1 / count`.
///
/// # Arguments
/// * `target_col` - Column to rank
/// * `over_col` - Column to partition by (typically "date")
///
/// # Returns
/// Polars expression for the percentile ranks.
pub fn percentile_rank_xsection(target_col: &str, over_col: &str) -> Expr {
    let options = RankOptions { method: RankMethod::Average, descending: false };

    (col(target_col).rank(options, None).cast(DataType::Float64)
        / col(target_col).count().cast(DataType::Float64))
    .over([col(over_col)])
}

/// Cross-sectional z-score transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standardizer;

impl Standardizer {
    /// Create a new standardizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply standardization to an array.
    ///
    /// # Errors
    /// Returns `MathError::ZeroVariance` for a constant cross-section.
    pub fn apply(&self, data: &Array1<f64>) -> Result<Array1<f64>, MathError> {
        standardize(data)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn mean_std_is_population() {
        let (mean, std) = mean_std(&array![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(std, 2.0);
    }

    #[test]
    fn mean_std_skips_nan() {
        let (mean, _) = mean_std(&array![1.0, f64::NAN, 3.0]).unwrap();
        assert_relative_eq!(mean, 2.0);
        assert!(mean_std(&array![f64::NAN]).is_none());
    }

    #[test]
    fn standardize_zero_mean_unit_variance() {
        let result = standardize(&array![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let (mean, std) = mean_std(&result).unwrap();
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(std, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn standardize_constant_errors() {
        assert!(matches!(
            Standardizer::new().apply(&array![5.0, 5.0, 5.0]),
            Err(MathError::ZeroVariance)
        ));
    }

    #[test]
    fn empty_array_handling() {
        let empty: Array1<f64> = array![];
        assert!(standardize(&empty).unwrap().is_empty());
    }

    #[test]
    fn percentile_rank_averages_ties() {
        let df = df! {
            "date" => &["d1", "d1", "d1", "d1", "d2", "d2"],
            "value" => &[10.0, 20.0, 20.0, 40.0, 1.0, 2.0],
        }
        .unwrap();

        let ranked = df
            .lazy()
            .with_column(percentile_rank_xsection("value", "date").alias("rank"))
            .collect()
            .unwrap();

        let ranks: Vec<f64> =
            ranked.column("rank").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_relative_eq!(ranks[0], 0.25);
        assert_relative_eq!(ranks[1], 0.625);
        assert_relative_eq!(ranks[2], 0.625);
        assert_relative_eq!(ranks[3], 1.0);
        assert_relative_eq!(ranks[4], 0.5);
        assert_relative_eq!(ranks[5], 1.0);
    }
}
