//! Size neutralization.

use capflow_math::simple_regression;
use ndarray::Array1;
use tracing::debug;

use crate::FactorError;

/// Residualize `values` against `log_market_cap` by OLS.
///
/// The output is `value - intercept - slope * log_market_cap`, which has zero
/// in-sample correlation with `log_market_cap`.
///
/// # Errors
/// Returns `FactorError::DataInsufficient` if the regression cannot be fitted
/// (fewer than two rows or constant market cap).
pub fn neutralize(
    values: &Array1<f64>,
    log_market_cap: &Array1<f64>,
) -> Result<Array1<f64>, FactorError> {
    let fit = simple_regression(log_market_cap, values)
        .map_err(|e| FactorError::from_math("neutralize", values.len(), e))?;

    debug!(slope = fit.slope, intercept = fit.intercept, r2 = fit.r_squared, "neutralized");
    Ok(fit.residuals)
}

/// Residualize `|values|` against `log_market_cap`, then re-attach each
/// value's direction.
///
/// Non-positive values carry a negative sign, so an instrument with net
/// outflow scores on the negative side of its magnitude residual.
///
/// # Errors
/// Returns `FactorError::DataInsufficient` if the regression cannot be fitted.
pub fn abs_neutralize(
    values: &Array1<f64>,
    log_market_cap: &Array1<f64>,
) -> Result<Array1<f64>, FactorError> {
    let magnitude = values.mapv(f64::abs);
    let fit = simple_regression(log_market_cap, &magnitude)
        .map_err(|e| FactorError::from_math("abs_neutralize", values.len(), e))?;

    debug!(slope = fit.slope, intercept = fit.intercept, r2 = fit.r_squared, "abs-neutralized");

    Ok(fit
        .residuals
        .iter()
        .zip(values.iter())
        .map(|(r, v)| if *v > 0.0 { *r } else { -*r })
        .collect())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use capflow_math::correlation;
    use ndarray::array;
    use rand::{SeedableRng, distributions::Uniform, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    use super::*;

    fn sample(n: usize, seed: u64) -> (Array1<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let caps = Uniform::new(22.3, 28.0);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let log_cap: Array1<f64> = (0..n).map(|_| caps.sample(&mut rng)).collect();
        let values: Array1<f64> =
            log_cap.iter().map(|c| 0.4 * (c - 25.0) + noise.sample(&mut rng)).collect();
        (values, log_cap)
    }

    #[test]
    fn neutralized_is_uncorrelated_with_size() {
        let (values, log_cap) = sample(300, 11);
        assert!(correlation(&values, &log_cap).unwrap() > 0.3);

        let neu = neutralize(&values, &log_cap).unwrap();

        assert_relative_eq!(correlation(&neu, &log_cap).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn abs_neutralize_reattaches_direction() {
        let (values, log_cap) = sample(300, 5);
        let magnitude_resid = neutralize(&values.mapv(f64::abs), &log_cap).unwrap();

        let absneu = abs_neutralize(&values, &log_cap).unwrap();

        for i in 0..values.len() {
            let sign = if values[i] > 0.0 { 1.0 } else { -1.0 };
            assert_relative_eq!(absneu[i], sign * magnitude_resid[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn abs_neutralize_sign_flips_with_direction() {
        // Same magnitude and size, opposite direction: scores mirror each other.
        let values = array![2.0, -2.0, 0.5, 1.0];
        let log_cap = array![23.0, 23.0, 24.0, 25.0];

        let absneu = abs_neutralize(&values, &log_cap).unwrap();

        assert_relative_eq!(absneu[0], -absneu[1], epsilon = 1e-12);
    }

    #[test]
    fn empty_cross_section_is_insufficient() {
        let empty: Array1<f64> = array![];
        assert!(matches!(
            neutralize(&empty, &empty),
            Err(FactorError::DataInsufficient { stage: "neutralize", actual: 0, .. })
        ));
    }

    #[test]
    fn constant_size_is_insufficient() {
        let values = array![1.0, -1.0, 0.5];
        let log_cap = array![24.0, 24.0, 24.0];
        assert!(matches!(
            abs_neutralize(&values, &log_cap),
            Err(FactorError::DataInsufficient { stage: "abs_neutralize", .. })
        ));
    }
}
