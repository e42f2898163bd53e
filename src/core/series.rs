//! Daily weather history for one location.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

/// A daily weather variable, identified by its NASA POWER parameter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeatherVariable {
    /// Mean air temperature at 2 m (°C).
    T2m,
    /// Daily maximum air temperature at 2 m (°C).
    T2mMax,
    /// Daily minimum air temperature at 2 m (°C).
    T2mMin,
    /// Wind speed at 10 m (m/s).
    Ws10m,
    /// Bias-corrected total precipitation (mm/day).
    Prectotcorr,
}

impl WeatherVariable {
    /// Every variable the pipeline forecasts, in canonical order.
    pub const ALL: [Self; 5] = [
        Self::T2m,
        Self::T2mMax,
        Self::T2mMin,
        Self::Ws10m,
        Self::Prectotcorr,
    ];

    /// The POWER parameter code, used on the wire and as report map keys.
    pub fn code(&self) -> &'static str {
        match self {
            Self::T2m => "T2M",
            Self::T2mMax => "T2M_MAX",
            Self::T2mMin => "T2M_MIN",
            Self::Ws10m => "WS10M",
            Self::Prectotcorr => "PRECTOTCORR",
        }
    }

    /// Parse a parameter code. Accepts the legacy `PRECTOT` spelling that
    /// older POWER responses use for precipitation.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "T2M" => Some(Self::T2m),
            "T2M_MAX" => Some(Self::T2mMax),
            "T2M_MIN" => Some(Self::T2mMin),
            "WS10M" => Some(Self::Ws10m),
            "PRECTOT" | "PRECTOTCORR" => Some(Self::Prectotcorr),
            _ => None,
        }
    }

    /// Whether the variable measures precipitation. Precipitation gets
    /// occurrence-threshold handling and an F1 score on top of MAE/RMSE.
    pub fn is_precipitation(&self) -> bool {
        matches!(self, Self::Prectotcorr)
    }
}

impl fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Daily weather history for one location.
///
/// Stored column-major: one value vector per variable, each aligned with
/// `dates`. Dates are strictly increasing and unique; missing observations
/// are `f64::NAN`. Construct through [`HistorySeriesBuilder`], which sorts
/// and deduplicates on ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    dates: Vec<NaiveDate>,
    variables: Vec<WeatherVariable>,
    columns: Vec<Vec<f64>>,
}

impl HistorySeries {
    /// Start building a series over the given variables.
    pub fn builder(variables: &[WeatherVariable]) -> HistorySeriesBuilder {
        HistorySeriesBuilder::new(variables)
    }

    /// Number of days in the series.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series holds no days at all.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The dates, strictly ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The variables tracked by this series, in builder order.
    pub fn variables(&self) -> &[WeatherVariable] {
        &self.variables
    }

    /// The last (latest) date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// The value column for one variable, aligned with [`Self::dates`].
    pub fn column(&self, variable: WeatherVariable) -> Option<&[f64]> {
        self.variables
            .iter()
            .position(|v| *v == variable)
            .map(|i| self.columns[i].as_slice())
    }

    /// Copy of the series with rows dropped where every variable is missing.
    pub fn without_blank_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| self.columns.iter().any(|col| !col[row].is_nan()))
            .collect();

        Self {
            dates: keep.iter().map(|&row| self.dates[row]).collect(),
            variables: self.variables.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| keep.iter().map(|&row| col[row]).collect())
                .collect(),
        }
    }

    /// Copy of the series with short gaps filled per variable.
    ///
    /// Interior runs of up to `limit` consecutive missing values are filled
    /// linearly between their neighbours; at the edges, the `limit` positions
    /// nearest the first or last observation are filled flat. Longer gaps
    /// stay missing.
    pub fn interpolated(&self, limit: usize) -> Self {
        Self {
            dates: self.dates.clone(),
            variables: self.variables.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| interpolate_column(col, limit))
                .collect(),
        }
    }
}

/// Incremental, order-insensitive ingestion of daily observations.
///
/// Cells may arrive in any date order and may repeat; the builder keys rows
/// by date, so repeated dates overwrite (last write wins) and `build`
/// produces a date-ascending series.
#[derive(Debug, Clone)]
pub struct HistorySeriesBuilder {
    variables: Vec<WeatherVariable>,
    rows: BTreeMap<NaiveDate, Vec<f64>>,
}

impl HistorySeriesBuilder {
    /// Create a builder tracking the given variables (duplicates ignored).
    pub fn new(variables: &[WeatherVariable]) -> Self {
        let mut unique = Vec::new();
        for v in variables {
            if !unique.contains(v) {
                unique.push(*v);
            }
        }
        Self {
            variables: unique,
            rows: BTreeMap::new(),
        }
    }

    /// Record one observation. Values for variables the builder does not
    /// track are ignored.
    pub fn set(&mut self, date: NaiveDate, variable: WeatherVariable, value: f64) -> &mut Self {
        if let Some(index) = self.variables.iter().position(|v| *v == variable) {
            let row = self
                .rows
                .entry(date)
                .or_insert_with(|| vec![f64::NAN; self.variables.len()]);
            row[index] = value;
        }
        self
    }

    /// Number of distinct dates recorded so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no dates have been recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finish building; rows come out date-ascending.
    pub fn build(self) -> HistorySeries {
        let mut dates = Vec::with_capacity(self.rows.len());
        let mut columns = vec![Vec::with_capacity(self.rows.len()); self.variables.len()];
        for (date, row) in self.rows {
            dates.push(date);
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        HistorySeries {
            dates,
            variables: self.variables,
            columns,
        }
    }
}

fn interpolate_column(values: &[f64], limit: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = values.to_vec();

    let mut idx = 0;
    while idx < n {
        if !result[idx].is_nan() {
            idx += 1;
            continue;
        }

        // Missing run [start, end).
        let start = idx;
        let mut end = idx;
        while end < n && result[end].is_nan() {
            end += 1;
        }
        let gap = end - start;

        let left = if start > 0 {
            Some(result[start - 1])
        } else {
            None
        };
        let right = if end < n { Some(values[end]) } else { None };

        match (left, right) {
            (Some(l), Some(r)) if gap <= limit => {
                let segments = (gap + 1) as f64;
                for (j, slot) in result[start..end].iter_mut().enumerate() {
                    let t = (j + 1) as f64 / segments;
                    *slot = l + t * (r - l);
                }
            }
            (None, Some(r)) => {
                // Leading run: flat-fill the positions nearest the first
                // observation, up to the gap limit.
                let fill_from = end.saturating_sub(limit).max(start);
                for slot in result[fill_from..end].iter_mut() {
                    *slot = r;
                }
            }
            (Some(l), None) => {
                // Trailing run: flat-fill up to the gap limit past the last
                // observation.
                let fill_to = (start + limit).min(end);
                for slot in result[start..fill_to].iter_mut() {
                    *slot = l;
                }
            }
            // Interior gap longer than the limit, or a fully missing column.
            _ => {}
        }

        idx = end;
    }

    result
}
