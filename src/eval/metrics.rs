//! Forecast error metrics with missing-value masking.

/// Mean absolute error and root mean squared error over the positions where
/// both slices hold an observed value.
///
/// Returns `(inf, inf)` when no position qualifies, so a model evaluated
/// against an entirely missing validation slice is scored out of contention
/// instead of failing.
pub fn masked_errors(actual: &[f64], predicted: &[f64]) -> (f64, f64) {
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut count = 0usize;

    for (a, p) in actual.iter().zip(predicted.iter()) {
        if a.is_nan() || p.is_nan() {
            continue;
        }
        let diff = a - p;
        abs_sum += diff.abs();
        sq_sum += diff * diff;
        count += 1;
    }

    if count == 0 {
        return (f64::INFINITY, f64::INFINITY);
    }
    let n = count as f64;
    (abs_sum / n, (sq_sum / n).sqrt())
}

/// F1 over binary occurrence vectors: `2TP / (2TP + FP + FN)`, and 0.0 when
/// the denominator is zero.
pub fn f1_score(truth: &[bool], predicted: &[bool]) -> f64 {
    let mut tp = 0u32;
    let mut fp = 0u32;
    let mut missed = 0u32;

    for (t, p) in truth.iter().zip(predicted.iter()) {
        match (t, p) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => missed += 1,
            (false, false) => {}
        }
    }

    let denominator = 2 * tp + fp + missed;
    if denominator == 0 {
        0.0
    } else {
        2.0 * f64::from(tp) / f64::from(denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_slices_score_zero_error() {
        let values = [1.0, 2.0, 3.0];
        let (mae, rmse) = masked_errors(&values, &values);
        assert_eq!(mae, 0.0);
        assert_eq!(rmse, 0.0);
    }

    #[test]
    fn known_errors() {
        let (mae, rmse) = masked_errors(&[1.0, 2.0, 3.0], &[2.0, 2.0, 5.0]);
        assert_relative_eq!(mae, 1.0, epsilon = 1e-10);
        assert_relative_eq!(rmse, (5.0_f64 / 3.0).sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn missing_positions_are_masked_out() {
        let (mae, rmse) = masked_errors(&[1.0, f64::NAN, 3.0], &[2.0, 2.0, f64::NAN]);
        assert_relative_eq!(mae, 1.0, epsilon = 1e-10);
        assert_relative_eq!(rmse, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn fully_masked_slices_score_infinite_error() {
        let (mae, rmse) = masked_errors(&[f64::NAN, f64::NAN], &[1.0, 2.0]);
        assert!(mae.is_infinite());
        assert!(rmse.is_infinite());
    }

    #[test]
    fn f1_counts_matches_and_misses() {
        // tp = 1, fp = 1, fn = 1 -> 2 / 4
        let truth = [true, true, false, false];
        let predicted = [true, false, true, false];
        assert_relative_eq!(f1_score(&truth, &predicted), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn f1_is_zero_when_nothing_is_positive_on_one_side_only() {
        assert_eq!(f1_score(&[true, true], &[false, false]), 0.0);
        assert_eq!(f1_score(&[false, false], &[true, true]), 0.0);
    }

    #[test]
    fn f1_with_empty_denominator_is_zero() {
        assert_eq!(f1_score(&[false, false], &[false, false]), 0.0);
    }

    #[test]
    fn perfect_agreement_scores_one() {
        let bits = [true, false, true];
        assert_relative_eq!(f1_score(&bits, &bits), 1.0, epsilon = 1e-10);
    }
}
