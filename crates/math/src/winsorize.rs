//! Winsorization operations for outlier handling.

use ndarray::Array1;

use crate::{MathError, mean_std};

/// Clip a cross-section to `mean ± sig * std`.
///
/// Mean and population standard deviation are taken from the input itself,
/// over its finite values. NaN entries pass through untouched.
///
/// # Arguments
/// * `data` - Input array
/// * `sig` - Clip width in standard deviations (e.g. 3.5)
///
/// # Returns
/// Winsorized array.
///
/// # Errors
/// Returns `MathError::InvalidSignificance` if `sig` is not positive and finite.
pub fn winsorize(data: &Array1<f64>, sig: f64) -> Result<Array1<f64>, MathError> {
    if !(sig.is_finite() && sig > 0.0) {
        return Err(MathError::InvalidSignificance(sig));
    }

    let Some((mean, std)) = mean_std(data) else {
        return Ok(data.clone());
    };

    let lower = mean - sig * std;
    let upper = mean + sig * std;

    Ok(data.mapv(|x| if x.is_nan() { x } else { x.clamp(lower, upper) }))
}

/// Winsorization configuration and transform.
#[derive(Debug, Clone, Copy)]
pub struct Winsorizer {
    /// Clip width in standard deviations.
    sig: f64,
}

impl Winsorizer {
    /// Create a new winsorizer.
    ///
    /// # Errors
    /// Returns `MathError::InvalidSignificance` if `sig` is not positive and finite.
    pub fn new(sig: f64) -> Result<Self, MathError> {
        if !(sig.is_finite() && sig > 0.0) {
            return Err(MathError::InvalidSignificance(sig));
        }
        Ok(Self { sig })
    }

    /// Get the clip width.
    #[must_use]
    pub const fn sig(&self) -> f64 {
        self.sig
    }

    /// Apply winsorization to an array.
    ///
    /// # Errors
    /// Returns error if winsorization fails.
    pub fn apply(&self, data: &Array1<f64>) -> Result<Array1<f64>, MathError> {
        winsorize(data, self.sig)
    }
}

impl Default for Winsorizer {
    fn default() -> Self {
        Self { sig: 3.5 }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Cauchy, Distribution};
    use rstest::rstest;

    use super::*;

    #[test]
    fn winsorize_clips_extremes() {
        let mut values = vec![0.0; 19];
        values.push(100.0);
        let data = Array1::from_vec(values);
        let (mean, std) = mean_std(&data).unwrap();

        let result = winsorize(&data, 2.0).unwrap();

        assert_relative_eq!(result[19], mean + 2.0 * std, epsilon = 1e-12);
        assert_relative_eq!(result[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn winsorize_preserves_middle() {
        let data = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let result = winsorize(&data, 3.5).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn winsorize_stays_within_input_band() {
        let mut rng = StdRng::seed_from_u64(7);
        let dist = Cauchy::new(0.0, 1.0).unwrap();
        let data: Array1<f64> = (0..500).map(|_| dist.sample(&mut rng)).collect();
        let (mean, std) = mean_std(&data).unwrap();

        let result = winsorize(&data, 3.5).unwrap();

        for &x in &result {
            assert!(x >= mean - 3.5 * std - 1e-9);
            assert!(x <= mean + 3.5 * std + 1e-9);
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn invalid_significance_errors(#[case] sig: f64) {
        let data = array![1.0, 2.0, 3.0];
        assert!(winsorize(&data, sig).is_err());
        assert!(Winsorizer::new(sig).is_err());
    }

    #[test]
    fn winsorize_handles_nan() {
        let data = array![1.0, f64::NAN, 3.0, 4.0, 5.0];
        let result = winsorize(&data, 1.0).unwrap();
        assert!(result[1].is_nan());
    }

    #[test]
    fn winsorize_empty_array() {
        let data: Array1<f64> = array![];
        let result = winsorize(&data, 3.5).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn winsorizer_defaults() {
        assert_relative_eq!(Winsorizer::default().sig(), 3.5);
        let w = Winsorizer::new(2.0).unwrap();
        assert_eq!(w.apply(&array![1.0, 2.0, 3.0]).unwrap().len(), 3);
    }
}
