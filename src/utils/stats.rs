//! Small statistical helpers shared across the pipeline.

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean over the finite entries of a slice, `NaN` when there are none.
pub fn finite_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    mean(&finite)
}

/// Sample quantile with linear interpolation between order statistics.
///
/// Uses the `h = q * (n - 1)` positioning convention, so `q = 0` is the
/// minimum and `q = 1` the maximum.
///
/// # Example
/// ```
/// use raincast::utils::sample_quantile;
///
/// let values = [4.0, 1.0, 3.0, 2.0];
/// assert_eq!(sample_quantile(&values, 0.5), 2.5);
/// assert_eq!(sample_quantile(&values, 1.0), 4.0);
/// ```
pub fn sample_quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if q <= 0.0 {
        return sorted[0];
    }
    if q >= 1.0 {
        return sorted[n - 1];
    }

    let h = q * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn finite_mean_skips_nan_entries() {
        assert_relative_eq!(
            finite_mean(&[1.0, f64::NAN, 3.0]),
            2.0,
            epsilon = 1e-10
        );
        assert!(finite_mean(&[f64::NAN, f64::NAN]).is_nan());
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(sample_quantile(&values, 0.0), 1.0, epsilon = 1e-10);
        assert_relative_eq!(sample_quantile(&values, 0.5), 2.5, epsilon = 1e-10);
        assert_relative_eq!(sample_quantile(&values, 1.0), 4.0, epsilon = 1e-10);
        // h = 0.25 * 3 = 0.75 lands between the first two values.
        assert_relative_eq!(sample_quantile(&values, 0.25), 1.75, epsilon = 1e-10);
    }

    #[test]
    fn quantile_handles_unsorted_input() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(sample_quantile(&values, 0.5), 2.5, epsilon = 1e-10);
    }

    #[test]
    fn quantile_of_single_value_is_that_value() {
        assert_relative_eq!(sample_quantile(&[7.0], 0.3), 7.0, epsilon = 1e-10);
    }

    #[test]
    fn quantile_of_empty_slice_is_nan() {
        assert!(sample_quantile(&[], 0.5).is_nan());
    }
}
