//! Forecast evaluation: masked error metrics, occurrence F1 and the
//! validation-time threshold search for precipitation.

pub mod metrics;
pub mod threshold;

pub use metrics::{f1_score, masked_errors};
pub use threshold::{best_f1_threshold, occurrence_f1};

use crate::core::WeatherVariable;
use crate::models::ModelScore;

/// Score one model's validation forecast for one variable.
///
/// Positions where either side is missing are discarded first. If nothing
/// remains the model scores infinite errors (and zero F1 for precipitation)
/// rather than erroring, keeping it out of contention without aborting the
/// variable. Precipitation additionally gets an occurrence F1 at the
/// threshold found by [`best_f1_threshold`].
pub fn score_forecast(
    actual: &[f64],
    predicted: &[f64],
    variable: WeatherVariable,
    reference_threshold: f64,
) -> ModelScore {
    let mut masked_actual = Vec::new();
    let mut masked_predicted = Vec::new();
    for (a, p) in actual.iter().zip(predicted.iter()) {
        if !a.is_nan() && !p.is_nan() {
            masked_actual.push(*a);
            masked_predicted.push(*p);
        }
    }

    if masked_actual.is_empty() {
        return ModelScore::failed(variable);
    }

    let (mae, rmse) = masked_errors(&masked_actual, &masked_predicted);
    let f1 = if variable.is_precipitation() {
        let threshold = best_f1_threshold(&masked_actual, &masked_predicted, reference_threshold);
        Some(occurrence_f1(
            &masked_actual,
            &masked_predicted,
            reference_threshold,
            threshold,
        ))
    } else {
        None
    };

    ModelScore { mae, rmse, f1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn continuous_variables_score_without_f1() {
        let score = score_forecast(
            &[20.0, 21.0, 22.0],
            &[20.5, 21.5, 21.5],
            WeatherVariable::T2m,
            1.0,
        );
        assert_relative_eq!(score.mae, 0.5, epsilon = 1e-10);
        assert!(score.rmse > 0.0);
        assert!(score.f1.is_none());
    }

    #[test]
    fn precipitation_scores_carry_f1() {
        let score = score_forecast(
            &[0.0, 2.0, 5.0, 0.0],
            &[0.1, 1.8, 4.0, 0.2],
            WeatherVariable::Prectotcorr,
            1.0,
        );
        assert!(score.f1.is_some());
        assert_relative_eq!(score.f1.unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn fully_missing_validation_scores_out_of_contention() {
        let score = score_forecast(
            &[f64::NAN, f64::NAN],
            &[1.0, 2.0],
            WeatherVariable::Prectotcorr,
            1.0,
        );
        assert!(score.mae.is_infinite());
        assert!(score.rmse.is_infinite());
        assert_eq!(score.f1, Some(0.0));
    }

    #[test]
    fn masking_applies_before_the_threshold_search() {
        // The NaN pair would otherwise poison both the errors and the grid.
        let score = score_forecast(
            &[f64::NAN, 2.0, 0.0],
            &[9.9, 1.5, 0.1],
            WeatherVariable::Prectotcorr,
            1.0,
        );
        assert_relative_eq!(score.mae, 0.3, epsilon = 1e-10);
        assert_eq!(score.f1, Some(1.0));
    }
}
