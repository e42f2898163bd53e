//! The feature row for the day being forecast.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::core::{FeatureTable, HistorySeries};
use crate::error::{PredictError, Result};
use crate::features::supervised::seasonal_radians;
use crate::utils::finite_mean;

/// Build the feature row for `target_date`, one day past the history.
///
/// Works directly off each variable's observed tail (missing values
/// compacted away): the last observation, lag `L` as the value `L` positions
/// from the end (or the earliest observation when the tail is shorter), and
/// trailing-window means over however many observations exist. Variables
/// with no observations contribute nothing; [`align_row`] fills those
/// columns later. Errors only when the history holds no rows at all.
pub fn build_future_row(
    series: &HistorySeries,
    target_date: NaiveDate,
    lags: &[usize],
    windows: &[usize],
) -> Result<HashMap<String, f64>> {
    if series.is_empty() {
        return Err(PredictError::EmptyHistory);
    }

    let mut row = HashMap::new();

    let doy = target_date.ordinal() as f64;
    let angle = seasonal_radians(doy);
    row.insert("DOY".to_string(), doy);
    row.insert("DOY_SIN".to_string(), angle.sin());
    row.insert("DOY_COS".to_string(), angle.cos());

    for &variable in series.variables() {
        let Some(column) = series.column(variable) else {
            continue;
        };
        let tail: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
        if tail.is_empty() {
            continue;
        }
        let code = variable.code();

        row.insert(code.to_string(), tail[tail.len() - 1]);

        for &lag in lags {
            let value = if tail.len() >= lag {
                tail[tail.len() - lag]
            } else {
                tail[0]
            };
            row.insert(format!("{}_lag_{}", code, lag), value);
        }
        for &window in windows {
            let take = window.min(tail.len());
            let value = finite_mean(&tail[tail.len() - take..]);
            row.insert(format!("{}_roll_{}", code, window), value);
        }
    }

    Ok(row)
}

/// Per-column fill values for [`align_row`]: the last training row where
/// available, else the training column mean.
pub fn fallback_values(train: &FeatureTable, names: &[String]) -> HashMap<String, f64> {
    names
        .iter()
        .filter_map(|name| {
            let column = train.column(name)?;
            let value = column
                .last()
                .copied()
                .filter(|v| !v.is_nan())
                .or_else(|| Some(finite_mean(column)).filter(|v| !v.is_nan()))?;
            Some((name.clone(), value))
        })
        .collect()
}

/// Align a sparse future row against the full feature column list.
///
/// Every output cell is guaranteed present: a missing or `NaN` cell takes
/// the per-column fallback, and 0.0 when the fallback is missing too.
pub fn align_row(
    row: &HashMap<String, f64>,
    names: &[String],
    fallback: &HashMap<String, f64>,
) -> Vec<f64> {
    names
        .iter()
        .map(|name| {
            row.get(name)
                .copied()
                .filter(|v| !v.is_nan())
                .or_else(|| fallback.get(name).copied().filter(|v| !v.is_nan()))
                .unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WeatherVariable;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn series_of(values: &[f64]) -> HistorySeries {
        let mut builder = HistorySeries::builder(&[WeatherVariable::T2m]);
        for (i, v) in values.iter().enumerate() {
            builder.set(day(1) + Duration::days(i as i64), WeatherVariable::T2m, *v);
        }
        builder.build()
    }

    #[test]
    fn empty_history_is_an_error() {
        let series = HistorySeries::builder(&[WeatherVariable::T2m]).build();
        let result = build_future_row(&series, day(1), &[1], &[3]);
        assert!(matches!(result, Err(PredictError::EmptyHistory)));
    }

    #[test]
    fn row_uses_the_observed_tail() {
        let series = series_of(&[10.0, 20.0, 30.0]);
        let row = build_future_row(&series, day(4), &[1, 2], &[2]).unwrap();

        assert_eq!(row["T2M"], 30.0);
        assert_eq!(row["T2M_lag_1"], 30.0);
        assert_eq!(row["T2M_lag_2"], 20.0);
        assert_relative_eq!(row["T2M_roll_2"], 25.0, epsilon = 1e-10);
        assert_eq!(row["DOY"], day(4).ordinal() as f64);
    }

    #[test]
    fn short_tail_falls_back_to_earliest_observation() {
        let series = series_of(&[10.0, 20.0, 30.0]);
        let row = build_future_row(&series, day(4), &[7], &[14]).unwrap();

        assert_eq!(row["T2M_lag_7"], 10.0);
        assert_relative_eq!(row["T2M_roll_14"], 20.0, epsilon = 1e-10);
    }

    #[test]
    fn missing_values_are_compacted_before_lagging() {
        let series = series_of(&[10.0, f64::NAN, 30.0]);
        let row = build_future_row(&series, day(4), &[2], &[2]).unwrap();
        // Tail is [10, 30]; lag 2 reaches the first observation.
        assert_eq!(row["T2M_lag_2"], 10.0);
    }

    #[test]
    fn fully_missing_variable_contributes_nothing() {
        let series = series_of(&[f64::NAN, f64::NAN]);
        let row = build_future_row(&series, day(3), &[1], &[2]).unwrap();
        assert!(!row.contains_key("T2M"));
        assert!(row.contains_key("DOY"));
    }

    #[test]
    fn align_fills_from_fallback_then_zero() {
        let mut row = HashMap::new();
        row.insert("A".to_string(), 1.0);
        let mut fallback = HashMap::new();
        fallback.insert("B".to_string(), 2.0);

        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(align_row(&row, &names, &fallback), vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn fallback_prefers_last_training_row() {
        let table = FeatureTable::from_columns(
            vec![day(1), day(2)],
            vec!["A".to_string()],
            vec![vec![5.0, 7.0]],
        );
        let names = vec!["A".to_string()];
        let fallback = fallback_values(&table, &names);
        assert_eq!(fallback["A"], 7.0);
    }

    #[test]
    fn fallback_of_empty_training_table_is_empty() {
        let table = FeatureTable::from_columns(vec![], vec!["A".to_string()], vec![vec![]]);
        let fallback = fallback_values(&table, &["A".to_string()]);
        assert!(fallback.is_empty());
    }
}
