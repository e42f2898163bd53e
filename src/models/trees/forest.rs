//! Random forest regression via smartcore.

use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{PredictError, Result};
use crate::models::trees::{to_matrix, TableRegressor};

/// Random forest with a fixed, reproducible configuration.
#[derive(Debug)]
pub struct RandomForest {
    model: Option<RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
}

impl RandomForest {
    /// Create an unfitted forest: 50 trees of depth 10, seed 42.
    pub fn new() -> Self {
        Self { model: None }
    }

    fn parameters() -> RandomForestRegressorParameters {
        RandomForestRegressorParameters {
            max_depth: Some(10),
            min_samples_leaf: 2,
            min_samples_split: 5,
            n_trees: 50,
            m: None,
            keep_samples: false,
            seed: 42,
        }
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRegressor for RandomForest {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        if features.len() != targets.len() {
            return Err(PredictError::Fit(format!(
                "feature rows ({}) do not match targets ({})",
                features.len(),
                targets.len()
            )));
        }
        let x = to_matrix(features)?;
        let y = targets.to_vec();

        let model = RandomForestRegressor::fit(&x, &y, Self::parameters())
            .map_err(|e| PredictError::Fit(format!("random forest training failed: {e}")))?;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PredictError::Fit("random forest model is not fitted".to_string()))?;
        let x = to_matrix(features)?;
        model
            .predict(&x)
            .map_err(|e| PredictError::Fit(format!("random forest prediction failed: {e}")))
    }

    fn name(&self) -> &'static str {
        "RandomForest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for a in 0..6 {
            for b in 0..6 {
                let (x1, x2) = (a as f64, b as f64);
                features.push(vec![x1, x2]);
                targets.push(2.0 * x1 + 3.0 * x2);
            }
        }
        (features, targets)
    }

    #[test]
    fn interpolates_a_linear_surface() {
        let (features, targets) = grid_data();
        let mut model = RandomForest::new();
        model.fit(&features, &targets).unwrap();

        // An interior point should land between its grid neighbours.
        let predictions = model.predict(&[vec![3.0, 3.0]]).unwrap();
        assert!(predictions[0] > 8.0 && predictions[0] < 22.0);
    }

    #[test]
    fn refitting_is_deterministic() {
        let (features, targets) = grid_data();
        let mut first = RandomForest::new();
        let mut second = RandomForest::new();
        first.fit(&features, &targets).unwrap();
        second.fit(&features, &targets).unwrap();

        let query = vec![vec![1.5, 4.5], vec![4.0, 0.5]];
        assert_eq!(first.predict(&query).unwrap(), second.predict(&query).unwrap());
    }

    #[test]
    fn unfitted_model_reports_an_error() {
        let model = RandomForest::new();
        assert!(model.predict(&[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn empty_table_is_rejected() {
        let mut model = RandomForest::new();
        assert!(model.fit(&[], &[]).is_err());
    }
}
