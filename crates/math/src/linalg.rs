//! Least squares operations for factor neutralization.

use ndarray::Array1;

use crate::MathError;

/// Result of a univariate ordinary least squares fit `y = intercept + slope * x`.
#[derive(Debug, Clone)]
pub struct UnivariateFit {
    /// Intercept.
    pub intercept: f64,
    /// Slope.
    pub slope: f64,
    /// Residuals `y - intercept - slope * x`.
    pub residuals: Array1<f64>,
    /// R-squared.
    pub r_squared: f64,
}

/// Regress `y` on `x` with an intercept.
///
/// Uses centered sums, so the residuals sum to zero and are orthogonal to `x`
/// up to floating-point error.
///
/// # Arguments
/// * `x` - Regressor (n,)
/// * `y` - Response (n,)
///
/// # Errors
/// Returns error if dimensions mismatch, fewer than two observations are
/// given, or `x` has no dispersion.
pub fn simple_regression(x: &Array1<f64>, y: &Array1<f64>) -> Result<UnivariateFit, MathError> {
    let n = x.len();
    if y.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: y.len() });
    }
    if n < 2 {
        return Err(MathError::InsufficientData { required: 2, actual: n });
    }

    let x_mean = x.sum() / n as f64;
    let y_mean = y.sum() / n as f64;

    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| (xi - x_mean) * (yi - y_mean)).sum();
    let syy: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();

    if !sxx.is_finite() || sxx <= f64::EPSILON * x_mean.abs().max(1.0) * n as f64 {
        return Err(MathError::LinearAlgebra("regressor has no dispersion".to_string()));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let residuals: Array1<f64> =
        x.iter().zip(y.iter()).map(|(xi, yi)| yi - intercept - slope * xi).collect();

    let ss_res: f64 = residuals.iter().map(|r| r.powi(2)).sum();
    let r_squared = if syy > 0.0 { 1.0 - ss_res / syy } else { 0.0 };

    Ok(UnivariateFit { intercept, slope, residuals, r_squared })
}

/// Sample Pearson correlation between two arrays.
///
/// # Errors
/// Returns error if dimensions mismatch, fewer than two observations are
/// given, or either array is constant.
pub fn correlation(a: &Array1<f64>, b: &Array1<f64>) -> Result<f64, MathError> {
    let n = a.len();
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }
    if n < 2 {
        return Err(MathError::InsufficientData { required: 2, actual: n });
    }

    let a_mean = a.sum() / n as f64;
    let b_mean = b.sum() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (ai, bi) in a.iter().zip(b.iter()) {
        let da = ai - a_mean;
        let db = bi - b_mean;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return Err(MathError::ZeroVariance);
    }

    Ok(cov / (var_a.sqrt() * var_b.sqrt()))
}
