//! Seasonal differencing for the weekly SARIMA model.

/// Apply one order of seasonal differencing.
///
/// # Arguments
/// * `series` - The input series
/// * `period` - Seasonal period (7 for daily data with a weekly cycle)
///
/// # Returns
/// The differenced series `w[t] = series[t + period] - series[t]`, of
/// length `series.len() - period`. Empty when the series is too short to
/// difference.
pub fn seasonal_difference(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || series.len() <= period {
        return Vec::new();
    }
    series
        .iter()
        .skip(period)
        .zip(series.iter())
        .map(|(curr, prev)| curr - prev)
        .collect()
}

/// Reverse seasonal differencing for forecast values.
///
/// Each differenced forecast is added to the value one period earlier on
/// the original scale, walking forward so that later steps can anchor on
/// earlier integrated forecasts.
///
/// # Arguments
/// * `forecast_diff` - Forecasts on the differenced scale
/// * `original` - The original series the differences were taken from
/// * `period` - Seasonal period used for differencing
///
/// # Returns
/// The forecasts on the original scale.
pub fn seasonal_integrate(forecast_diff: &[f64], original: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || original.len() < period {
        return forecast_diff.to_vec();
    }
    let mut extended = original.to_vec();
    for &diff in forecast_diff {
        let anchor = extended[extended.len() - period];
        extended.push(anchor + diff);
    }
    extended.split_off(original.len())
}
