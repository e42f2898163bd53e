//! Supervised feature table and its temporal train/validation split.

use chrono::NaiveDate;

use crate::core::series::WeatherVariable;

/// Column-major table of model features over historical dates.
///
/// Rows align with `dates`; columns are named. Produced by
/// [`crate::features::build_supervised`], which is also the naming
/// authority for lag, rolling and target columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Suffix marking one-step-ahead target columns.
    pub const TARGET_SUFFIX: &'static str = "_target_h1";

    /// Name of the one-step-ahead target column for a variable.
    pub fn target_name(variable: WeatherVariable) -> String {
        format!("{}{}", variable.code(), Self::TARGET_SUFFIX)
    }

    pub(crate) fn from_columns(
        dates: Vec<NaiveDate>,
        names: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == dates.len()));
        Self {
            dates,
            names,
            columns,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All column names, in construction order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Column names that are features, i.e. everything except targets.
    pub fn feature_names(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| !n.ends_with(Self::TARGET_SUFFIX))
            .cloned()
            .collect()
    }

    /// One column by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Copy of the table keeping only rows where every column is present.
    pub fn drop_missing_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| self.columns.iter().all(|col| !col[row].is_nan()))
            .collect();

        Self {
            dates: keep.iter().map(|&row| self.dates[row]).collect(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| keep.iter().map(|&row| col[row]).collect())
                .collect(),
        }
    }

    /// Row-major matrix over the named columns, in the given column order.
    /// Unknown names contribute `NaN` cells.
    pub fn rows(&self, names: &[String]) -> Vec<Vec<f64>> {
        let selected: Vec<Option<&[f64]>> =
            names.iter().map(|name| self.column(name)).collect();
        (0..self.len())
            .map(|row| {
                selected
                    .iter()
                    .map(|col| col.map_or(f64::NAN, |c| c[row]))
                    .collect()
            })
            .collect()
    }

    /// Split into a training prefix and validation suffix.
    ///
    /// The cut is `floor(len * fraction)`, raised to `min_rows` and clamped
    /// to the table length, so short tables become all-training with an
    /// empty validation suffix. Row order never changes.
    pub fn split(&self, fraction: f64, min_rows: usize) -> TemporalSplit {
        let cut = ((self.len() as f64 * fraction).floor() as usize)
            .max(min_rows)
            .min(self.len());
        TemporalSplit {
            train: self.slice(0, cut),
            validation: self.slice(cut, self.len()),
        }
    }

    fn slice(&self, from: usize, to: usize) -> Self {
        Self {
            dates: self.dates[from..to].to_vec(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c[from..to].to_vec()).collect(),
        }
    }
}

/// A [`FeatureTable`] partitioned in time: validation rows are strictly
/// later than every training row.
#[derive(Debug, Clone)]
pub struct TemporalSplit {
    /// Training prefix.
    pub train: FeatureTable,
    /// Validation suffix; may be empty for short tables.
    pub validation: FeatureTable,
}
