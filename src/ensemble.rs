//! Inverse-error fusion of the per-variable model outcomes.
//!
//! Every model that produced an outcome participates with a weight
//! proportional to the inverse of its squared validation RMSE, so a
//! failed model (sentinel error) still contributes a vanishingly small
//! share instead of being dropped. The reported RMSE of the fused
//! forecast is an optimistic rescaling of the best member's RMSE.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::PredictorConfig;
use crate::models::{ModelKind, ModelOutcome};

/// How the final per-variable forecast is chosen from the model pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionStrategy {
    /// Inverse-RMSE weighted blend of all models.
    #[default]
    Ensemble,
    /// The single model with the lowest validation RMSE.
    BestSingle,
}

/// The chosen forecast for one variable, with its blended metrics and
/// the weight given to each model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleChoice {
    /// `"Ensemble"` for a blend, otherwise the winning model's name.
    pub best_model: String,
    /// The chosen forecast value.
    pub value: f64,
    /// Reported RMSE of the choice.
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Reported MAE of the choice.
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Normalized weight per model name.
    pub weights: BTreeMap<String, f64>,
    /// Blended occurrence F1; precipitation only.
    #[serde(rename = "F1", skip_serializing_if = "Option::is_none", default)]
    pub f1: Option<f64>,
}

/// Choose the final forecast for one variable from its model outcomes.
///
/// Outcomes are expected in [`ModelKind::ALL`] order; ties in
/// [`SelectionStrategy::BestSingle`] resolve to the earliest model.
pub fn choose(outcomes: &[(ModelKind, ModelOutcome)], config: &PredictorConfig) -> EnsembleChoice {
    match config.strategy {
        SelectionStrategy::Ensemble => fuse(outcomes, config),
        SelectionStrategy::BestSingle => best_single(outcomes, config),
    }
}

/// Replace a non-finite validation error with the large sentinel so it
/// stays usable in weight arithmetic.
fn sanitize(error: f64, sentinel: f64) -> f64 {
    if error.is_finite() {
        error
    } else {
        sentinel
    }
}

fn fuse(outcomes: &[(ModelKind, ModelOutcome)], config: &PredictorConfig) -> EnsembleChoice {
    let raw: Vec<f64> = outcomes
        .iter()
        .map(|(_, outcome)| {
            let rmse = sanitize(outcome.score().rmse, config.error_sentinel);
            1.0 / (rmse * rmse + config.ensemble_epsilon)
        })
        .collect();
    let total: f64 = raw.iter().sum();

    let mut weights = BTreeMap::new();
    let mut value = 0.0;
    let mut mae = 0.0;
    let mut f1 = 0.0;
    let mut has_f1 = false;
    let mut min_rmse = f64::INFINITY;

    for ((kind, outcome), raw_weight) in outcomes.iter().zip(raw.iter()) {
        let weight = if total > 0.0 { raw_weight / total } else { 0.0 };
        weights.insert(kind.name().to_string(), weight);

        let score = outcome.score();
        value += weight * outcome.prediction();
        mae += weight * sanitize(score.mae, config.error_sentinel);
        min_rmse = min_rmse.min(sanitize(score.rmse, config.error_sentinel));
        if let Some(model_f1) = score.f1 {
            has_f1 = true;
            f1 += weight * model_f1;
        }
    }

    EnsembleChoice {
        best_model: "Ensemble".to_string(),
        value,
        rmse: config.ensemble_rmse_factor * min_rmse,
        mae,
        weights,
        f1: has_f1.then_some(f1),
    }
}

fn best_single(outcomes: &[(ModelKind, ModelOutcome)], config: &PredictorConfig) -> EnsembleChoice {
    let mut best: Option<(usize, f64)> = None;
    for (i, (_, outcome)) in outcomes.iter().enumerate() {
        let rmse = sanitize(outcome.score().rmse, config.error_sentinel);
        match best {
            Some((_, current)) if rmse >= current => {}
            _ => best = Some((i, rmse)),
        }
    }

    let Some((best_index, _)) = best else {
        return EnsembleChoice {
            best_model: String::new(),
            value: 0.0,
            rmse: f64::INFINITY,
            mae: f64::INFINITY,
            weights: BTreeMap::new(),
            f1: None,
        };
    };

    let mut weights = BTreeMap::new();
    for (i, (kind, _)) in outcomes.iter().enumerate() {
        let weight = if i == best_index { 1.0 } else { 0.0 };
        weights.insert(kind.name().to_string(), weight);
    }

    let (kind, outcome) = &outcomes[best_index];
    let score = outcome.score();
    EnsembleChoice {
        best_model: kind.name().to_string(),
        value: outcome.prediction(),
        rmse: score.rmse,
        mae: score.mae,
        weights,
        f1: score.f1,
    }
}
