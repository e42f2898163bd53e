//! Tree ensembles fitted on the supervised feature table.

mod forest;
mod gbt;

pub use forest::RandomForest;
pub use gbt::GradientBoosting;

use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{PredictError, Result};

/// A regression model fitted on row-major tabular features.
///
/// Both tree ensembles implement this so the pipeline can fit and score
/// them uniformly; a fit or predict error makes the caller fall back to
/// persistence for that variable.
pub trait TableRegressor {
    /// Fit the model on feature rows and aligned targets.
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()>;

    /// Predict one value per feature row.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Short model name for logs.
    fn name(&self) -> &'static str;
}

/// Flatten row-major feature rows into a `DenseMatrix`.
pub(crate) fn to_matrix(features: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let n_samples = features.len();
    if n_samples == 0 {
        return Err(PredictError::Fit("feature table has no rows".to_string()));
    }

    let n_features = features[0].len();
    if n_features == 0 {
        return Err(PredictError::Fit("feature rows are empty".to_string()));
    }

    let mut flat = Vec::with_capacity(n_samples * n_features);
    for row in features {
        if row.len() != n_features {
            return Err(PredictError::Fit(
                "feature rows have inconsistent widths".to_string(),
            ));
        }
        flat.extend_from_slice(row);
    }

    Ok(DenseMatrix::new(n_samples, n_features, flat, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_rejected() {
        assert!(to_matrix(&[]).is_err());
        assert!(to_matrix(&[vec![]]).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(to_matrix(&rows).is_err());
    }

    #[test]
    fn rectangular_table_converts() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        assert!(to_matrix(&rows).is_ok());
    }
}
