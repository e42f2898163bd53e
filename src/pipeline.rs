//! The forecasting pipeline: fetch history, fit the model pool per
//! variable, and assemble the report.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use futures::StreamExt;
use log::{info, warn};

use crate::config::PredictorConfig;
use crate::core::{FeatureTable, HistorySeries, TemporalSplit, WeatherVariable};
use crate::ensemble;
use crate::error::{PredictError, Result};
use crate::eval::score_forecast;
use crate::features::{align_row, build_future_row, build_supervised, fallback_values};
use crate::history::HistoryProvider;
use crate::models::{
    GradientBoosting, ModelKind, ModelOutcome, ModelScore, RandomForest, Sarima, TableRegressor,
};
use crate::report::{ModelReport, PredictionInput, PredictionResult};

/// Single-day weather forecaster over a history provider.
///
/// The provider supplies daily history; everything downstream of it is
/// deterministic, so two predictors over the same provider and config
/// produce identical reports.
pub struct Predictor<P: HistoryProvider> {
    provider: P,
    config: PredictorConfig,
}

impl<P: HistoryProvider> Predictor<P> {
    /// Create a predictor with the default configuration.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, PredictorConfig::default())
    }

    /// Create a predictor with an explicit configuration.
    pub fn with_config(provider: P, config: PredictorConfig) -> Self {
        Self { provider, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Forecast all variables for a date using the configured history
    /// depth.
    pub async fn predict_day_default(
        &self,
        latitude: f64,
        longitude: f64,
        target_date: &str,
    ) -> Result<PredictionResult> {
        self.predict_day(
            latitude,
            longitude,
            target_date,
            self.config.years_back,
            &WeatherVariable::ALL,
        )
        .await
    }

    /// Forecast the requested variables for one target date.
    ///
    /// History spans `years_back` years (at least one) up to the day
    /// before the target. The CPU-heavy model fitting runs on a
    /// blocking thread so the async runtime stays responsive.
    pub async fn predict_day(
        &self,
        latitude: f64,
        longitude: f64,
        target_date: &str,
        years_back: u32,
        variables: &[WeatherVariable],
    ) -> Result<PredictionResult> {
        let started = Instant::now();
        let target = NaiveDate::parse_from_str(target_date, "%Y-%m-%d")
            .map_err(|_| PredictError::InvalidDate(target_date.to_string()))?;

        let years_back = years_back.max(1);
        let start = target - chrono::Duration::days(365 * i64::from(years_back));
        let end = target - chrono::Duration::days(1);

        info!(
            "Forecasting {target_date} at ({latitude}, {longitude}) \
             from {years_back} years of history"
        );
        let series = self
            .provider
            .fetch(latitude, longitude, start, end, variables)
            .await?;

        let config = self.config.clone();
        let variables = variables.to_vec();
        let mut report =
            tokio::task::spawn_blocking(move || run_pipeline(&series, target, &variables, &config))
                .await
                .map_err(|e| PredictError::Join(e.to_string()))??;

        report.execution_time = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(
            "Forecast for {target_date} finished in {:.2}s",
            report.execution_time
        );

        Ok(PredictionResult {
            input: PredictionInput {
                latitude,
                longitude,
                date: target_date.to_string(),
                years_back,
            },
            ai_models: report,
        })
    }

    /// Forecast several dates with bounded concurrency.
    ///
    /// Results come back in input order. A date that fails is logged
    /// and omitted; an all-failure batch is an empty vector.
    pub async fn predict_multiple_days(
        &self,
        latitude: f64,
        longitude: f64,
        target_dates: &[&str],
        years_back: u32,
        variables: &[WeatherVariable],
    ) -> Vec<PredictionResult> {
        let runs = target_dates.iter().map(|date| {
            let date = date.to_string();
            async move {
                let outcome = self
                    .predict_day(latitude, longitude, &date, years_back, variables)
                    .await;
                (date, outcome)
            }
        });

        let outcomes: Vec<(String, Result<PredictionResult>)> = futures::stream::iter(runs)
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (date, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => warn!("Skipping {date}: {e}"),
            }
        }
        results
    }
}

/// The synchronous per-date pipeline: clean, interpolate, build the
/// supervised table, fit the model pool per variable, and fuse.
fn run_pipeline(
    series: &HistorySeries,
    target: NaiveDate,
    variables: &[WeatherVariable],
    config: &PredictorConfig,
) -> Result<ModelReport> {
    if series.without_blank_rows().is_empty() {
        return Err(PredictError::EmptySeries);
    }

    // Interpolate on the positionally intact series so lag and rolling
    // features never stitch non-adjacent days together; rows the limit
    // cannot fill are dropped later by the supervised table.
    let interpolated = series.interpolated(config.interpolation_limit);
    let table = build_supervised(&interpolated, &config.lags, &config.windows);
    let split = table.split(config.train_fraction, config.min_train_rows);

    let future_row = build_future_row(&interpolated, target, &config.lags, &config.windows)?;
    let feature_names = table.feature_names();
    let fallback = fallback_values(&split.train, &feature_names);
    let x_future = vec![align_row(&future_row, &feature_names, &fallback)];

    let mut metrics = BTreeMap::new();
    let mut predictions = BTreeMap::new();
    let mut chosen = BTreeMap::new();

    for &variable in variables {
        let outcomes = model_outcomes(
            variable,
            &interpolated,
            &split,
            &feature_names,
            &x_future,
            config,
        );

        let mut variable_metrics = BTreeMap::new();
        let mut variable_predictions = BTreeMap::new();
        for (kind, outcome) in &outcomes {
            variable_metrics.insert(kind.name().to_string(), outcome.score());
            variable_predictions.insert(kind.name().to_string(), outcome.prediction());
        }

        chosen.insert(
            variable.code().to_string(),
            ensemble::choose(&outcomes, config),
        );
        metrics.insert(variable.code().to_string(), variable_metrics);
        predictions.insert(variable.code().to_string(), variable_predictions);
    }

    Ok(ModelReport {
        metrics,
        predictions,
        chosen,
        execution_time: 0.0,
    })
}

/// Fit and score the full model pool for one variable. A model that
/// errors or forecasts a non-finite value degrades to persistence.
fn model_outcomes(
    variable: WeatherVariable,
    interpolated: &HistorySeries,
    split: &TemporalSplit,
    feature_names: &[String],
    x_future: &[Vec<f64>],
    config: &PredictorConfig,
) -> Vec<(ModelKind, ModelOutcome)> {
    let history_column: Vec<f64> = interpolated
        .column(variable)
        .map(|c| c.to_vec())
        .unwrap_or_default();

    let mut outcomes = Vec::with_capacity(ModelKind::ALL.len());
    for kind in ModelKind::ALL {
        let attempt = match kind {
            ModelKind::Sarimax => sarima_outcome(variable, interpolated, split, config),
            ModelKind::GradientBoosting => {
                let mut model = GradientBoosting::new();
                tree_outcome(&mut model, variable, split, feature_names, x_future, config)
            }
            ModelKind::RandomForest => {
                let mut model = RandomForest::new();
                tree_outcome(&mut model, variable, split, feature_names, x_future, config)
            }
        };

        let outcome = match attempt {
            Ok(outcome) if outcome.prediction().is_finite() => outcome,
            Ok(_) => {
                warn!(
                    "{} forecast non-finite {}; using persistence",
                    kind.name(),
                    variable.code()
                );
                ModelOutcome::fallback_from(&history_column, variable)
            }
            Err(e) => {
                warn!(
                    "{} failed for {}: {e}; using persistence",
                    kind.name(),
                    variable.code()
                );
                ModelOutcome::fallback_from(&history_column, variable)
            }
        };
        outcomes.push((kind, outcome));
    }
    outcomes
}

/// Fit the weekly SARIMA: validated on the hold-out continuation, then
/// refitted on the full cleaned history for the final one-step forecast.
fn sarima_outcome(
    variable: WeatherVariable,
    interpolated: &HistorySeries,
    split: &TemporalSplit,
    config: &PredictorConfig,
) -> Result<ModelOutcome> {
    let code = variable.code();
    let train_values: Vec<f64> = split
        .train
        .column(code)
        .ok_or_else(|| PredictError::Fit(format!("missing feature column {code}")))?
        .to_vec();

    let model = Sarima::weekly();
    let validated = model.fit(&train_values)?;

    let actual = split.validation.column(code).unwrap_or(&[]);
    let forecast = validated.forecast(actual.len());
    let score = score_forecast(actual, &forecast, variable, config.precip_threshold_mm);

    let full_history: Vec<f64> = interpolated
        .column(variable)
        .map(|c| c.iter().copied().filter(|v| !v.is_nan()).collect())
        .unwrap_or_default();
    let refitted = model.fit(&full_history)?;
    let prediction = refitted
        .forecast(1)
        .first()
        .copied()
        .ok_or_else(|| PredictError::Fit("empty forecast".to_string()))?;

    Ok(ModelOutcome::Fitted { prediction, score })
}

/// Fit a table regressor, score it on the validation rows, and predict
/// the aligned future row.
fn tree_outcome(
    model: &mut dyn TableRegressor,
    variable: WeatherVariable,
    split: &TemporalSplit,
    feature_names: &[String],
    x_future: &[Vec<f64>],
    config: &PredictorConfig,
) -> Result<ModelOutcome> {
    let target_name = FeatureTable::target_name(variable);
    let y_train: Vec<f64> = split
        .train
        .column(&target_name)
        .ok_or_else(|| PredictError::Fit(format!("missing target column {target_name}")))?
        .to_vec();
    let x_train = split.train.rows(feature_names);

    model.fit(&x_train, &y_train)?;

    let x_validation = split.validation.rows(feature_names);
    let score = if x_validation.is_empty() {
        ModelScore::failed(variable)
    } else {
        let actual = split.validation.column(&target_name).unwrap_or(&[]);
        let forecast = model.predict(&x_validation)?;
        score_forecast(actual, &forecast, variable, config.precip_threshold_mm)
    };

    let prediction = model
        .predict(x_future)?
        .first()
        .copied()
        .ok_or_else(|| PredictError::Fit("empty prediction".to_string()))?;

    Ok(ModelOutcome::Fitted { prediction, score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::synthetic_history;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_year_history() -> HistorySeries {
        synthetic_history(
            -23.55,
            -46.63,
            date(2022, 3, 15),
            date(2024, 3, 14),
            &WeatherVariable::ALL,
        )
        .unwrap()
    }

    #[test]
    fn pipeline_reports_every_variable_and_model() {
        let series = two_year_history();
        let report = run_pipeline(
            &series,
            date(2024, 3, 15),
            &WeatherVariable::ALL,
            &PredictorConfig::default(),
        )
        .unwrap();

        assert_eq!(report.metrics.len(), 5);
        assert_eq!(report.predictions.len(), 5);
        assert_eq!(report.chosen.len(), 5);

        for variable in WeatherVariable::ALL {
            let code = variable.code();
            let models = &report.metrics[code];
            assert_eq!(models.len(), 3);
            for kind in ModelKind::ALL {
                assert!(models.contains_key(kind.name()));
                assert!(report.predictions[code][kind.name()].is_finite());
            }
            assert!(report.chosen[code].value.is_finite());
        }
    }

    #[test]
    fn precipitation_carries_an_f1_and_temperature_does_not() {
        let series = two_year_history();
        let report = run_pipeline(
            &series,
            date(2024, 3, 15),
            &[WeatherVariable::T2m, WeatherVariable::Prectotcorr],
            &PredictorConfig::default(),
        )
        .unwrap();

        assert!(report.chosen["PRECTOTCORR"].f1.is_some());
        assert!(report.chosen["T2M"].f1.is_none());
    }

    #[test]
    fn requested_subset_limits_the_report() {
        let series = two_year_history();
        let report = run_pipeline(
            &series,
            date(2024, 3, 15),
            &[WeatherVariable::Ws10m],
            &PredictorConfig::default(),
        )
        .unwrap();

        assert_eq!(report.chosen.len(), 1);
        assert!(report.chosen.contains_key("WS10M"));
    }

    #[test]
    fn all_missing_history_is_an_empty_series_error() {
        let mut builder = HistorySeries::builder(&[WeatherVariable::T2m]);
        for offset in 0..40 {
            builder.set(
                date(2024, 1, 1) + chrono::Duration::days(offset),
                WeatherVariable::T2m,
                f64::NAN,
            );
        }
        let series = builder.build();

        let err = run_pipeline(
            &series,
            date(2024, 3, 15),
            &[WeatherVariable::T2m],
            &PredictorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::EmptySeries));
    }

    #[test]
    fn tiny_history_still_produces_a_report_via_persistence() {
        let series = synthetic_history(
            10.0,
            10.0,
            date(2024, 3, 1),
            date(2024, 3, 10),
            &WeatherVariable::ALL,
        )
        .unwrap();

        let report = run_pipeline(
            &series,
            date(2024, 3, 11),
            &WeatherVariable::ALL,
            &PredictorConfig::default(),
        )
        .unwrap();

        // Ten days cannot feed any model, so every value is the
        // persistence fallback and every score is the failure sentinel.
        for variable in WeatherVariable::ALL {
            let choice = &report.chosen[variable.code()];
            assert!(choice.value.is_finite());
            for score in report.metrics[variable.code()].values() {
                assert!(score.rmse.is_infinite());
            }
        }
    }
}
