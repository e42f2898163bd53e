//! Pipeline configuration.
//!
//! All tuning knobs live in an immutable [`PredictorConfig`] that is passed
//! into the pipeline, so two predictors with different settings can coexist
//! in one process.

use std::time::Duration;

use crate::ensemble::SelectionStrategy;

/// Configuration for a [`crate::pipeline::Predictor`].
///
/// `Default` carries the reference constants used throughout the pipeline;
/// `with_*` methods override individual knobs.
///
/// # Example
///
/// ```
/// use raincast::config::PredictorConfig;
/// use raincast::ensemble::SelectionStrategy;
///
/// let config = PredictorConfig::default()
///     .with_years_back(3)
///     .with_strategy(SelectionStrategy::BestSingle);
/// assert_eq!(config.years_back, 3);
/// ```
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Lag offsets (in days) used as features. Default `[1, 3, 7, 14, 21, 28]`.
    pub lags: Vec<usize>,
    /// Rolling-mean window lengths (in days). Default `[3, 7, 14]`.
    pub windows: Vec<usize>,
    /// Fraction of supervised rows assigned to the training prefix. Default 0.6.
    pub train_fraction: f64,
    /// Minimum number of training rows the temporal split aims for. Default 30.
    pub min_train_rows: usize,
    /// Precipitation occurrence reference threshold in millimetres. Default 1.0.
    pub precip_threshold_mm: f64,
    /// Stabilizer added to squared RMSE before inverting it into a weight.
    /// Default 1e-6.
    pub ensemble_epsilon: f64,
    /// Sentinel substituted for non-finite error metrics before weighting.
    /// Default 1e10.
    pub error_sentinel: f64,
    /// Optimism factor applied to the best single-model RMSE when reporting
    /// the fused RMSE. Default 0.95.
    pub ensemble_rmse_factor: f64,
    /// Longest run of consecutive missing days that interpolation will fill.
    /// Default 3.
    pub interpolation_limit: usize,
    /// Attempts per archive request before falling back to synthetic data.
    /// Default 3.
    pub retry_count: u32,
    /// Base backoff between retries; attempt `k` sleeps `k` times this.
    /// Default 2 s.
    pub retry_backoff: Duration,
    /// Per-request timeout for archive calls. Default 25 s.
    pub request_timeout: Duration,
    /// Years of history fetched before the target date. Default 6.
    pub years_back: u32,
    /// Upper bound on concurrently running date pipelines. Default 4.
    pub max_concurrency: usize,
    /// How the per-variable result is selected from the fitted models.
    pub strategy: SelectionStrategy,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 3, 7, 14, 21, 28],
            windows: vec![3, 7, 14],
            train_fraction: 0.6,
            min_train_rows: 30,
            precip_threshold_mm: 1.0,
            ensemble_epsilon: 1e-6,
            error_sentinel: 1e10,
            ensemble_rmse_factor: 0.95,
            interpolation_limit: 3,
            retry_count: 3,
            retry_backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(25),
            years_back: 6,
            max_concurrency: 4,
            strategy: SelectionStrategy::Ensemble,
        }
    }
}

impl PredictorConfig {
    /// Create a configuration with the reference constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the training fraction of the temporal split.
    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    /// Set the minimum number of training rows.
    pub fn with_min_train_rows(mut self, rows: usize) -> Self {
        self.min_train_rows = rows;
        self
    }

    /// Set the interpolation gap limit in days.
    pub fn with_interpolation_limit(mut self, limit: usize) -> Self {
        self.interpolation_limit = limit;
        self
    }

    /// Set the number of attempts per archive request.
    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Set the base retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the per-request timeout for archive calls.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the default number of years of history to fetch.
    pub fn with_years_back(mut self, years: u32) -> Self {
        self.years_back = years;
        self
    }

    /// Set the bound on concurrently running date pipelines.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Set the result selection strategy.
    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
