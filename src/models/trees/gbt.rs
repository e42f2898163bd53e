//! Gradient boosted regression trees.
//!
//! Boosting is built from smartcore decision stumps: each stage fits a
//! shallow tree to the current residuals on a random row subsample, and
//! the ensemble prediction is the target mean plus the shrunken sum of
//! stage predictions.

use rand::rngs::StdRng;
use rand::SeedableRng;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

use crate::error::{PredictError, Result};
use crate::models::trees::{to_matrix, TableRegressor};

/// Gradient boosted trees with a fixed, reproducible configuration.
#[derive(Debug)]
pub struct GradientBoosting {
    stages: usize,
    max_depth: u16,
    learning_rate: f64,
    subsample: f64,
    seed: u64,
    base: Option<f64>,
    trees: Vec<DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
}

impl GradientBoosting {
    /// Create an unfitted model: 50 stages of depth-3 trees, learning
    /// rate 0.1, 80% row subsampling, seed 42.
    pub fn new() -> Self {
        Self {
            stages: 50,
            max_depth: 3,
            learning_rate: 0.1,
            subsample: 0.8,
            seed: 42,
            base: None,
            trees: Vec::new(),
        }
    }
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRegressor for GradientBoosting {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        if features.len() != targets.len() {
            return Err(PredictError::Fit(format!(
                "feature rows ({}) do not match targets ({})",
                features.len(),
                targets.len()
            )));
        }
        let x_full = to_matrix(features)?;

        let n = targets.len();
        let base = targets.iter().sum::<f64>() / n as f64;
        let mut residuals: Vec<f64> = targets.iter().map(|y| y - base).collect();

        let sample_size = ((n as f64 * self.subsample) as usize).max(1);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.stages);

        for _ in 0..self.stages {
            let mut rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
            rows.sort_unstable();

            let sampled_rows: Vec<Vec<f64>> = rows.iter().map(|&i| features[i].clone()).collect();
            let sampled_residuals: Vec<f64> = rows.iter().map(|&i| residuals[i]).collect();
            let x_sample = to_matrix(&sampled_rows)?;

            let params = DecisionTreeRegressorParameters::default().with_max_depth(self.max_depth);
            let tree = DecisionTreeRegressor::fit(&x_sample, &sampled_residuals, params)
                .map_err(|e| PredictError::Fit(format!("boosting stage failed: {e}")))?;

            // Residuals are updated against the full table so later
            // stages see the out-of-sample error too.
            let stage = tree
                .predict(&x_full)
                .map_err(|e| PredictError::Fit(format!("boosting stage failed: {e}")))?;
            for (r, p) in residuals.iter_mut().zip(stage.iter()) {
                *r -= self.learning_rate * p;
            }
            trees.push(tree);
        }

        self.base = Some(base);
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        let base = self
            .base
            .ok_or_else(|| PredictError::Fit("gradient boosting model is not fitted".to_string()))?;
        let x = to_matrix(features)?;

        let mut predictions = vec![base; features.len()];
        for tree in &self.trees {
            let stage = tree
                .predict(&x)
                .map_err(|e| PredictError::Fit(format!("boosting prediction failed: {e}")))?;
            for (out, p) in predictions.iter_mut().zip(stage.iter()) {
                *out += self.learning_rate * p;
            }
        }
        Ok(predictions)
    }

    fn name(&self) -> &'static str {
        "GradientBoosting"
    }
}
