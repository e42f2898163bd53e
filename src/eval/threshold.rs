//! Precipitation occurrence threshold search.
//!
//! Rain amounts are continuous but the quantity callers care about is
//! whether it rains at all. Ground truth binarizes at a fixed reference
//! (1.0 mm by default); the predicted side gets its own threshold, chosen
//! on validation data to maximize occurrence F1.

use crate::eval::metrics::f1_score;
use crate::utils::sample_quantile;

/// Number of evenly spaced quantile candidates drawn from the predictions.
const QUANTILE_CANDIDATES: usize = 51;

/// Find the prediction threshold maximizing occurrence F1.
///
/// The candidate grid is the ascending, deduplicated union of `{0.0,
/// reference}` and [`QUANTILE_CANDIDATES`] sample quantiles of the predicted
/// values, restricted to non-negative candidates. The walk keeps a
/// candidate only on strict improvement, so ties break to the lowest
/// threshold. Degenerate inputs (either slice empty, or no true events
/// while no prediction exceeds zero) return the reference unchanged.
pub fn best_f1_threshold(actual_mm: &[f64], predicted_mm: &[f64], reference: f64) -> f64 {
    if actual_mm.is_empty() || predicted_mm.is_empty() {
        return reference;
    }

    let truth: Vec<bool> = actual_mm.iter().map(|v| *v >= reference).collect();
    let any_event = truth.iter().any(|t| *t);
    if !any_event && predicted_mm.iter().all(|p| *p <= 0.0) {
        return reference;
    }

    let mut grid = vec![0.0, reference];
    for i in 0..QUANTILE_CANDIDATES {
        let q = i as f64 / (QUANTILE_CANDIDATES - 1) as f64;
        grid.push(sample_quantile(predicted_mm, q));
    }
    grid.retain(|c| c.is_finite() && *c >= 0.0);
    grid.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    grid.dedup();

    let mut best_threshold = reference;
    let mut best_f1 = -1.0;
    for &candidate in &grid {
        let predicted_bin: Vec<bool> = predicted_mm.iter().map(|p| *p >= candidate).collect();
        let f1 = if !any_event && !predicted_bin.iter().any(|p| *p) {
            // Neither side claims an event; trivially perfect agreement.
            1.0
        } else {
            f1_score(&truth, &predicted_bin)
        };
        if f1 > best_f1 {
            best_f1 = f1;
            best_threshold = candidate;
        }
    }

    best_threshold
}

/// Occurrence F1 at explicit thresholds for each side. Scores 1.0 when
/// neither side binarizes to any event.
pub fn occurrence_f1(
    actual_mm: &[f64],
    predicted_mm: &[f64],
    actual_threshold: f64,
    predicted_threshold: f64,
) -> f64 {
    let truth: Vec<bool> = actual_mm.iter().map(|v| *v >= actual_threshold).collect();
    let predicted: Vec<bool> = predicted_mm
        .iter()
        .map(|v| *v >= predicted_threshold)
        .collect();

    if truth.iter().any(|t| *t) || predicted.iter().any(|p| *p) {
        f1_score(&truth, &predicted)
    } else {
        1.0
    }
}
