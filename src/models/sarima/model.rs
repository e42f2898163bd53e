//! Weekly seasonal ARIMA fitted by conditional least squares.

use crate::error::{PredictError, Result};
use crate::models::sarima::diff::{seasonal_difference, seasonal_integrate};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

/// Estimated SARIMA(1,0,1)(1,1,1) coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarimaParams {
    /// Mean of the seasonally differenced series.
    pub mu: f64,
    /// Non-seasonal AR(1) coefficient.
    pub phi: f64,
    /// Non-seasonal MA(1) coefficient.
    pub theta: f64,
    /// Seasonal AR(1) coefficient.
    pub seasonal_phi: f64,
    /// Seasonal MA(1) coefficient.
    pub seasonal_theta: f64,
}

impl SarimaParams {
    fn from_slice(flat: &[f64]) -> Self {
        Self {
            mu: flat[0],
            phi: flat[1],
            theta: flat[2],
            seasonal_phi: flat[3],
            seasonal_theta: flat[4],
        }
    }
}

/// SARIMA(1,0,1)(1,1,1) model specification.
///
/// The series is seasonally differenced once, then a multiplicative
/// ARMA structure is fitted on the differenced scale by minimizing the
/// conditional sum of squared one-step errors with Nelder-Mead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sarima {
    period: usize,
}

impl Sarima {
    /// Create a SARIMA model with the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// The weekly model used for daily weather series.
    pub fn weekly() -> Self {
        Self::new(7)
    }

    /// The seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Minimum number of observations required to fit.
    pub fn min_observations(&self) -> usize {
        2 * self.period + 2
    }

    /// Fit the model to a series of daily values.
    ///
    /// # Errors
    /// Returns [`PredictError::InsufficientData`] when the series is
    /// shorter than two full periods plus two observations, and
    /// [`PredictError::Fit`] when the series contains non-finite values
    /// or the optimizer cannot reach a finite objective.
    pub fn fit(&self, values: &[f64]) -> Result<FittedSarima> {
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(PredictError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PredictError::Fit(
                "series contains non-finite values".to_string(),
            ));
        }

        let diff = seasonal_difference(values, self.period);
        let mean = diff.iter().sum::<f64>() / diff.len() as f64;

        // Intercept is free; AR and MA coefficients are bounded for
        // stationarity and invertibility.
        let initial = [mean, 0.1, 0.1, 0.1, 0.1];
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(4));

        let period = self.period;
        let result = nelder_mead(
            |flat| conditional_sum_of_squares(&diff, period, flat),
            &initial,
            Some(&bounds),
            NelderMeadConfig::default(),
        );

        if result.optimal_value == f64::MAX || !result.optimal_value.is_finite() {
            return Err(PredictError::Fit(
                "conditional least squares did not reach a finite objective".to_string(),
            ));
        }

        let params = SarimaParams::from_slice(&result.optimal_point);
        let residuals = in_sample_residuals(&diff, period, &params);

        Ok(FittedSarima {
            params,
            period,
            original: values.to_vec(),
            diff,
            residuals,
        })
    }
}

impl Default for Sarima {
    fn default() -> Self {
        Self::weekly()
    }
}

/// A fitted SARIMA model ready to forecast.
#[derive(Debug, Clone)]
pub struct FittedSarima {
    params: SarimaParams,
    period: usize,
    original: Vec<f64>,
    diff: Vec<f64>,
    residuals: Vec<f64>,
}

impl FittedSarima {
    /// The estimated coefficients.
    pub fn params(&self) -> SarimaParams {
        self.params
    }

    /// The seasonal period the model was fitted with.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Forecast `horizon` steps beyond the fitted series.
    ///
    /// Forecasts are produced on the differenced scale with future
    /// shocks set to zero, then integrated back onto the original scale.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        if horizon == 0 {
            return Vec::new();
        }

        let mut diff = self.diff.clone();
        let mut residuals = self.residuals.clone();
        for _ in 0..horizon {
            let t = diff.len();
            let pred = one_step(&diff, &residuals, t, self.period, &self.params);
            diff.push(pred);
            residuals.push(0.0);
        }

        seasonal_integrate(&diff[self.diff.len()..], &self.original, self.period)
    }
}

/// One-step prediction of the differenced series at index `t`.
///
/// Implements the multiplicative expansion of
/// `(1 - phi B)(1 - Phi B^s)(w_t - mu) = (1 + theta B)(1 + Theta B^s) e_t`.
fn one_step(w: &[f64], residuals: &[f64], t: usize, period: usize, p: &SarimaParams) -> f64 {
    let s = period;
    let ar = p.phi * (w[t - 1] - p.mu);
    let seasonal_ar = p.seasonal_phi * (w[t - s] - p.mu);
    let cross_ar = p.phi * p.seasonal_phi * (w[t - s - 1] - p.mu);
    let ma = p.theta * residuals[t - 1];
    let seasonal_ma = p.seasonal_theta * residuals[t - s];
    let cross_ma = p.theta * p.seasonal_theta * residuals[t - s - 1];
    p.mu + ar + seasonal_ar - cross_ar + ma + seasonal_ma + cross_ma
}

/// Residuals of the one-step predictions, zero before the first index
/// where all lags are available.
fn in_sample_residuals(w: &[f64], period: usize, params: &SarimaParams) -> Vec<f64> {
    let start = period + 1;
    let mut residuals = vec![0.0; w.len()];
    for t in start..w.len() {
        let pred = one_step(w, &residuals, t, period, params);
        residuals[t] = w[t] - pred;
    }
    residuals
}

/// Conditional sum of squares objective for the optimizer.
fn conditional_sum_of_squares(w: &[f64], period: usize, flat: &[f64]) -> f64 {
    let start = period + 1;
    if w.len() <= start {
        return f64::MAX;
    }

    let params = SarimaParams::from_slice(flat);
    let residuals = in_sample_residuals(w, period, &params);
    let css: f64 = residuals[start..].iter().map(|e| e * e).sum();

    if css.is_finite() {
        css
    } else {
        f64::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WEEK: [f64; 7] = [3.0, 5.0, 4.0, 6.0, 2.0, 1.0, 7.0];

    fn weekly_series(n: usize) -> Vec<f64> {
        (0..n).map(|i| WEEK[i % 7]).collect()
    }

    #[test]
    fn repeats_a_pure_weekly_cycle() {
        let values = weekly_series(28);
        let fitted = Sarima::weekly().fit(&values).unwrap();
        let forecast = fitted.forecast(7);

        assert_eq!(forecast.len(), 7);
        for (f, expected) in forecast.iter().zip(WEEK.iter()) {
            assert_relative_eq!(*f, *expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn extends_a_linear_trend_with_seasonality() {
        // Trend plus weekly cycle differences to a constant, so the
        // one-step forecasts continue the trend exactly.
        let values: Vec<f64> = (0..35).map(|i| 0.5 * i as f64 + WEEK[i % 7]).collect();
        let fitted = Sarima::weekly().fit(&values).unwrap();
        let forecast = fitted.forecast(3);

        for (h, f) in forecast.iter().enumerate() {
            let i = 35 + h;
            assert_relative_eq!(*f, 0.5 * i as f64 + WEEK[i % 7], epsilon = 1e-4);
        }
    }

    #[test]
    fn constant_series_forecasts_the_constant() {
        let values = vec![12.5; 30];
        let fitted = Sarima::weekly().fit(&values).unwrap();
        let forecast = fitted.forecast(5);

        for f in &forecast {
            assert_relative_eq!(*f, 12.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn noisy_seasonal_series_yields_finite_forecasts() {
        let values: Vec<f64> = (0..60)
            .map(|i| 20.0 + WEEK[i % 7] + (i as f64 * 0.37).sin() * 1.5)
            .collect();
        let fitted = Sarima::weekly().fit(&values).unwrap();
        let forecast = fitted.forecast(14);

        assert_eq!(forecast.len(), 14);
        assert!(forecast.iter().all(|f| f.is_finite()));

        let params = fitted.params();
        assert!(params.phi.abs() <= 0.99);
        assert!(params.seasonal_theta.abs() <= 0.99);
    }

    #[test]
    fn too_short_series_is_rejected() {
        let values = weekly_series(15);
        let err = Sarima::weekly().fit(&values).unwrap_err();
        assert!(matches!(
            err,
            PredictError::InsufficientData { needed: 16, got: 15 }
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut values = weekly_series(28);
        values[10] = f64::NAN;
        let err = Sarima::weekly().fit(&values).unwrap_err();
        assert!(matches!(err, PredictError::Fit(_)));
    }

    #[test]
    fn zero_horizon_forecasts_nothing() {
        let values = weekly_series(28);
        let fitted = Sarima::weekly().fit(&values).unwrap();
        assert!(fitted.forecast(0).is_empty());
    }

    #[test]
    fn default_model_is_weekly() {
        assert_eq!(Sarima::default().period(), 7);
        assert_eq!(Sarima::weekly().min_observations(), 16);
    }
}
