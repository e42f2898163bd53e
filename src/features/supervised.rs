//! Supervised feature table construction.

use chrono::Datelike;

use crate::core::{FeatureTable, HistorySeries};

/// Build the supervised feature table for a daily history.
///
/// Per date: the day of year plus its sine/cosine encoding (period 365);
/// per variable: the raw value, one lag column per offset in `lags`, and one
/// trailing rolling mean per window in `windows` (minimum periods
/// `max(1, window / 2)`, counting only observed values). A one-step-ahead
/// target column is appended per variable. Rows with any missing cell are
/// dropped, so a history shorter than the largest lag produces an empty
/// table rather than an error.
pub fn build_supervised(
    series: &HistorySeries,
    lags: &[usize],
    windows: &[usize],
) -> FeatureTable {
    let dates = series.dates().to_vec();

    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    let doy: Vec<f64> = dates.iter().map(|d| d.ordinal() as f64).collect();
    names.push("DOY".to_string());
    columns.push(doy.clone());
    names.push("DOY_SIN".to_string());
    columns.push(doy.iter().map(|d| seasonal_radians(*d).sin()).collect());
    names.push("DOY_COS".to_string());
    columns.push(doy.iter().map(|d| seasonal_radians(*d).cos()).collect());

    for &variable in series.variables() {
        let Some(values) = series.column(variable) else {
            continue;
        };
        let code = variable.code();

        names.push(code.to_string());
        columns.push(values.to_vec());

        for &lag in lags {
            names.push(format!("{}_lag_{}", code, lag));
            columns.push(shifted(values, lag));
        }
        for &window in windows {
            names.push(format!("{}_roll_{}", code, window));
            columns.push(rolling_mean(values, window, (window / 2).max(1)));
        }
    }

    for &variable in series.variables() {
        let Some(values) = series.column(variable) else {
            continue;
        };
        // Tomorrow's value; undefined for the final row.
        let mut target: Vec<f64> = values.iter().skip(1).copied().collect();
        target.push(f64::NAN);
        names.push(FeatureTable::target_name(variable));
        columns.push(target);
    }

    FeatureTable::from_columns(dates, names, columns).drop_missing_rows()
}

/// Angle of a day-of-year on the annual cycle.
pub(crate) fn seasonal_radians(doy: f64) -> f64 {
    2.0 * std::f64::consts::PI * doy / 365.0
}

fn shifted(values: &[f64], lag: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in lag..values.len() {
        out[i] = values[i - lag];
    }
    out
}

/// Trailing rolling mean over the observed values inside each window.
/// Positions whose window holds fewer than `min_periods` observations
/// stay missing.
fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let from = (i + 1).saturating_sub(window);
            let mut sum = 0.0;
            let mut count = 0usize;
            for v in &values[from..=i] {
                if !v.is_nan() {
                    sum += v;
                    count += 1;
                }
            }
            if count >= min_periods {
                sum / count as f64
            } else {
                f64::NAN
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WeatherVariable;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series_of(values: &[f64]) -> HistorySeries {
        let mut builder = HistorySeries::builder(&[WeatherVariable::T2m]);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for (i, v) in values.iter().enumerate() {
            builder.set(
                start + chrono::Duration::days(i as i64),
                WeatherVariable::T2m,
                *v,
            );
        }
        builder.build()
    }

    #[test]
    fn calendar_features_encode_the_annual_cycle() {
        let series = series_of(&[1.0, 2.0, 3.0]);
        let table = build_supervised(&series, &[1], &[2]);

        let doy = table.column("DOY").unwrap();
        let doy_sin = table.column("DOY_SIN").unwrap();
        let doy_cos = table.column("DOY_COS").unwrap();
        for (i, d) in doy.iter().enumerate() {
            let angle = 2.0 * std::f64::consts::PI * d / 365.0;
            assert_relative_eq!(doy_sin[i], angle.sin(), epsilon = 1e-12);
            assert_relative_eq!(doy_cos[i], angle.cos(), epsilon = 1e-12);
        }
    }

    #[test]
    fn lag_columns_shift_by_their_offset() {
        let series = series_of(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let table = build_supervised(&series, &[1, 3], &[2]);

        // Row 0 (no lag_3) and the final row (no target) drop.
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("T2M").unwrap(), &[13.0, 14.0]);
        assert_eq!(table.column("T2M_lag_1").unwrap(), &[12.0, 13.0]);
        assert_eq!(table.column("T2M_lag_3").unwrap(), &[10.0, 11.0]);
    }

    #[test]
    fn target_is_the_next_day_value() {
        let series = series_of(&[10.0, 11.0, 12.0, 13.0]);
        let table = build_supervised(&series, &[1], &[2]);
        assert_eq!(table.column("T2M").unwrap(), &[11.0, 12.0]);
        assert_eq!(table.column("T2M_target_h1").unwrap(), &[12.0, 13.0]);
    }

    #[test]
    fn rolling_mean_honours_min_periods() {
        let out = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 4, 2);
        assert!(out[0].is_nan());
        assert_relative_eq!(out[1], 3.0, epsilon = 1e-10);
        assert_relative_eq!(out[2], 4.0, epsilon = 1e-10);
        assert_relative_eq!(out[3], 5.0, epsilon = 1e-10);
    }

    #[test]
    fn rolling_mean_skips_missing_values() {
        let out = rolling_mean(&[2.0, f64::NAN, 6.0], 3, 1);
        assert_relative_eq!(out[1], 2.0, epsilon = 1e-10);
        assert_relative_eq!(out[2], 4.0, epsilon = 1e-10);
    }

    #[test]
    fn short_history_yields_an_empty_table() {
        let series = series_of(&[1.0, 2.0, 3.0, 4.0]);
        let table = build_supervised(&series, &[28], &[3]);
        assert!(table.is_empty());
    }

    #[test]
    fn column_layout_lists_targets_last() {
        let series = series_of(&[1.0; 10]);
        let table = build_supervised(&series, &[1], &[2]);
        let names = table.column_names();
        assert_eq!(names.first().map(String::as_str), Some("DOY"));
        assert_eq!(
            names.last().map(String::as_str),
            Some("T2M_target_h1")
        );
    }
}
