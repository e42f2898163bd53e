//! Forecast report types and accuracy summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;

use crate::core::WeatherVariable;
use crate::ensemble::EnsembleChoice;
use crate::models::ModelScore;

/// Echo of the request a forecast was produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Target date as `YYYY-MM-DD`.
    pub date: String,
    /// Years of history requested before the target date.
    pub years_back: u32,
}

/// Per-variable model diagnostics and the chosen forecasts.
///
/// All maps are keyed by variable code first and, where applicable,
/// model name second, so serialized reports are stable and diffable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    /// Validation metrics per variable and model.
    pub metrics: BTreeMap<String, BTreeMap<String, ModelScore>>,
    /// Point forecasts per variable and model.
    pub predictions: BTreeMap<String, BTreeMap<String, f64>>,
    /// The final choice per variable.
    pub chosen: BTreeMap<String, EnsembleChoice>,
    /// Wall-clock pipeline time in seconds, rounded to centiseconds.
    pub execution_time: f64,
}

/// A complete single-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// The request that produced this forecast.
    pub input: PredictionInput,
    /// Model diagnostics and chosen values.
    pub ai_models: ModelReport,
}

/// Probability that a forecast with the given RMSE lands within
/// `tolerance` of the truth, assuming normally distributed errors.
///
/// A non-positive or non-finite RMSE reads as a degenerate error
/// distribution and yields probability 1.
pub fn chance_within_tolerance(rmse: f64, tolerance: f64) -> f64 {
    if !rmse.is_finite() || rmse <= 0.0 {
        return 1.0;
    }
    erf(tolerance / (std::f64::consts::SQRT_2 * rmse))
}

/// The display tolerance and unit used for a variable's accuracy line.
pub fn default_tolerance(variable: WeatherVariable) -> (f64, &'static str) {
    match variable {
        WeatherVariable::T2m => (1.0, "°C"),
        WeatherVariable::T2mMax | WeatherVariable::T2mMin => (1.5, "°C"),
        WeatherVariable::Ws10m => (1.5, " m/s"),
        WeatherVariable::Prectotcorr => (1.0, ""),
    }
}

/// Human-readable accuracy line for one variable of a forecast.
///
/// Precipitation reports its occurrence F1 when available; every other
/// case reports the chance of landing within `tolerance`. Returns an
/// empty string when the variable is not part of the forecast.
pub fn accuracy_line(
    result: &PredictionResult,
    variable: WeatherVariable,
    tolerance: f64,
    unit: &str,
) -> String {
    let Some(choice) = result.ai_models.chosen.get(variable.code()) else {
        return String::new();
    };

    if variable.is_precipitation() {
        if let Some(f1) = choice.f1 {
            return format!("Rain occurrence accuracy: {:.1}% (F1)", f1 * 100.0);
        }
    }

    let percent = chance_within_tolerance(choice.rmse, tolerance) * 100.0;
    format!("Accuracy (±{tolerance}{unit}): {percent:.1}%")
}

/// Accuracy lines for every forecast variable, using the default
/// tolerances, keyed by variable code.
pub fn accuracy_bundle(result: &PredictionResult) -> BTreeMap<String, String> {
    let mut lines = BTreeMap::new();
    for variable in WeatherVariable::ALL {
        let (tolerance, unit) = default_tolerance(variable);
        let line = accuracy_line(result, variable, tolerance, unit);
        if !line.is_empty() {
            lines.insert(variable.code().to_string(), line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_result() -> PredictionResult {
        let mut chosen = BTreeMap::new();
        chosen.insert(
            "T2M".to_string(),
            EnsembleChoice {
                best_model: "Ensemble".to_string(),
                value: 21.3,
                rmse: 1.0,
                mae: 0.8,
                weights: BTreeMap::from([("SARIMAX".to_string(), 1.0)]),
                f1: None,
            },
        );
        chosen.insert(
            "PRECTOTCORR".to_string(),
            EnsembleChoice {
                best_model: "Ensemble".to_string(),
                value: 2.4,
                rmse: 3.1,
                mae: 1.9,
                weights: BTreeMap::from([("SARIMAX".to_string(), 1.0)]),
                f1: Some(0.72),
            },
        );

        let mut t2m_metrics = BTreeMap::new();
        t2m_metrics.insert(
            "SARIMAX".to_string(),
            ModelScore {
                mae: 0.8,
                rmse: 1.0,
                f1: None,
            },
        );
        let mut metrics = BTreeMap::new();
        metrics.insert("T2M".to_string(), t2m_metrics);

        let mut t2m_predictions = BTreeMap::new();
        t2m_predictions.insert("SARIMAX".to_string(), 21.3);
        let mut predictions = BTreeMap::new();
        predictions.insert("T2M".to_string(), t2m_predictions);

        PredictionResult {
            input: PredictionInput {
                latitude: -23.55,
                longitude: -46.63,
                date: "2024-03-15".to_string(),
                years_back: 6,
            },
            ai_models: ModelReport {
                metrics,
                predictions,
                chosen,
                execution_time: 1.23,
            },
        }
    }

    #[test]
    fn one_sigma_tolerance_is_about_sixty_eight_percent() {
        assert_relative_eq!(chance_within_tolerance(1.0, 1.0), 0.6827, epsilon = 1e-3);
        assert_relative_eq!(chance_within_tolerance(2.0, 2.0), 0.6827, epsilon = 1e-3);
    }

    #[test]
    fn tight_errors_give_near_certainty() {
        assert!(chance_within_tolerance(0.1, 1.5) > 0.999);
    }

    #[test]
    fn degenerate_rmse_reads_as_certainty() {
        assert_eq!(chance_within_tolerance(0.0, 1.0), 1.0);
        assert_eq!(chance_within_tolerance(-2.0, 1.0), 1.0);
        assert_eq!(chance_within_tolerance(f64::INFINITY, 1.0), 1.0);
        assert_eq!(chance_within_tolerance(f64::NAN, 1.0), 1.0);
    }

    #[test]
    fn continuous_variables_report_a_tolerance_band() {
        let result = sample_result();
        let line = accuracy_line(&result, WeatherVariable::T2m, 1.0, "°C");
        assert!(line.starts_with("Accuracy (±1°C):"));
        assert!(line.ends_with('%'));
    }

    #[test]
    fn precipitation_prefers_the_f1_line() {
        let result = sample_result();
        let line = accuracy_line(&result, WeatherVariable::Prectotcorr, 1.0, "");
        assert_eq!(line, "Rain occurrence accuracy: 72.0% (F1)");
    }

    #[test]
    fn missing_variables_produce_no_line() {
        let result = sample_result();
        assert!(accuracy_line(&result, WeatherVariable::Ws10m, 1.5, " m/s").is_empty());

        let bundle = accuracy_bundle(&result);
        assert_eq!(bundle.len(), 2);
        assert!(bundle.contains_key("T2M"));
        assert!(bundle.contains_key("PRECTOTCORR"));
    }

    #[test]
    fn report_round_trips_through_json() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: PredictionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn report_serializes_with_wire_keys() {
        let result = sample_result();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["input"]["date"], "2024-03-15");
        assert_eq!(json["ai_models"]["metrics"]["T2M"]["SARIMAX"]["RMSE"], 1.0);
        assert_eq!(json["ai_models"]["chosen"]["PRECTOTCORR"]["F1"], 0.72);
        assert_eq!(json["ai_models"]["execution_time"], 1.23);
    }
}
