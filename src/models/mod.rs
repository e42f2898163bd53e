//! Forecasting models and their shared result types.
//!
//! Three models compete per variable: a weekly seasonal ARIMA on the raw
//! series and two tree ensembles on the supervised feature table. Each
//! produces a [`ModelOutcome`]; a model that cannot fit degrades to naive
//! persistence instead of aborting the variable.

pub mod sarima;
pub mod trees;

use serde::{Deserialize, Serialize};

use crate::core::WeatherVariable;

pub use sarima::{FittedSarima, Sarima};
pub use trees::{GradientBoosting, RandomForest, TableRegressor};

/// The competing model families, in fit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    /// Weekly seasonal ARIMA fitted on the raw series.
    Sarimax,
    /// Gradient-boosted trees on the supervised table.
    GradientBoosting,
    /// Random forest on the supervised table.
    RandomForest,
}

impl ModelKind {
    /// All model kinds, in the order they are fitted and reported.
    pub const ALL: [Self; 3] = [Self::Sarimax, Self::GradientBoosting, Self::RandomForest];

    /// The model name used as a report map key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sarimax => "SARIMAX",
            Self::GradientBoosting => "GradientBoosting",
            Self::RandomForest => "RandomForest",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validation-time error metrics for one (variable, model) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    /// Mean absolute error on the validation slice.
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Root mean squared error on the validation slice.
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Occurrence F1 at the optimal threshold; precipitation only.
    #[serde(rename = "F1", skip_serializing_if = "Option::is_none", default)]
    pub f1: Option<f64>,
}

impl ModelScore {
    /// The score of a model that could not be fitted or evaluated:
    /// infinite errors, and zero F1 for precipitation, so it never wins
    /// against a working alternative.
    pub fn failed(variable: WeatherVariable) -> Self {
        Self {
            mae: f64::INFINITY,
            rmse: f64::INFINITY,
            f1: variable.is_precipitation().then_some(0.0),
        }
    }
}

/// One model's contribution for one variable: a point forecast plus its
/// validation score, tagged by how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelOutcome {
    /// The model fitted and forecast normally.
    Fitted {
        /// One-step-ahead point forecast.
        prediction: f64,
        /// Validation metrics.
        score: ModelScore,
    },
    /// The model failed; naive persistence stands in.
    Fallback {
        /// Last observed value (or 0.0 for an unobserved variable).
        prediction: f64,
        /// Sentinel metrics from [`ModelScore::failed`].
        score: ModelScore,
    },
}

impl ModelOutcome {
    /// The point forecast, however it was obtained.
    pub fn prediction(&self) -> f64 {
        match self {
            Self::Fitted { prediction, .. } | Self::Fallback { prediction, .. } => *prediction,
        }
    }

    /// The validation score.
    pub fn score(&self) -> ModelScore {
        match self {
            Self::Fitted { score, .. } | Self::Fallback { score, .. } => *score,
        }
    }

    /// Whether this outcome is the persistence stand-in.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Build the persistence fallback for a variable from its cleaned
    /// history column.
    pub fn fallback_from(column: &[f64], variable: WeatherVariable) -> Self {
        Self::Fallback {
            prediction: persistence_value(column),
            score: ModelScore::failed(variable),
        }
    }
}

/// Naive persistence: the last finite value of the series, or 0.0 when no
/// value was ever observed.
pub fn persistence_value(column: &[f64]) -> f64 {
    column
        .iter()
        .rev()
        .copied()
        .find(|v| v.is_finite())
        .unwrap_or(0.0)
}
