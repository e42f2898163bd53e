//! Core data structures: the daily history series and the supervised
//! feature table derived from it.

mod series;
mod table;

pub use series::{HistorySeries, HistorySeriesBuilder, WeatherVariable};
pub use table::{FeatureTable, TemporalSplit};
