//! Daily weather history acquisition.
//!
//! The pipeline is provider-agnostic: [`OpenMeteoClient`] pulls
//! high-resolution reanalysis from the Open-Meteo archive,
//! [`PowerClient`] pulls observations from NASA POWER and degrades to
//! synthetic data chunk by chunk, [`ChainedProvider`] prefers the
//! former and falls back to the latter, and [`SyntheticProvider`]
//! serves fully synthetic history for offline use and tests.

mod chain;
mod openmeteo;
mod power;
mod synthetic;

pub use chain::ChainedProvider;
pub use openmeteo::OpenMeteoClient;
pub use power::PowerClient;
pub use synthetic::{coordinate_seed, synthetic_history, SyntheticProvider};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::{HistorySeries, WeatherVariable};
use crate::error::Result;

/// Split an inclusive date range into per-calendar-year chunks, the
/// request granularity both archive clients use.
pub(crate) fn year_chunks(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    use chrono::Datelike;

    let mut chunks = Vec::new();
    for year in start.year()..=end.year() {
        let from = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(start).max(start);
        let to = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(end).min(end);
        if from <= to {
            chunks.push((from, to));
        }
    }
    chunks
}

/// A source of daily weather history for a coordinate.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch daily values for the inclusive date range.
    ///
    /// The returned series is date-ascending and carries one column per
    /// requested variable; days a source cannot supply are NaN.
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        variables: &[WeatherVariable],
    ) -> Result<HistorySeries>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_chunks_clamp_to_the_range() {
        let chunks = year_chunks(date(2021, 6, 15), date(2023, 2, 10));
        assert_eq!(
            chunks,
            vec![
                (date(2021, 6, 15), date(2021, 12, 31)),
                (date(2022, 1, 1), date(2022, 12, 31)),
                (date(2023, 1, 1), date(2023, 2, 10)),
            ]
        );
    }

    #[test]
    fn single_partial_year_is_one_chunk() {
        let chunks = year_chunks(date(2024, 3, 1), date(2024, 3, 31));
        assert_eq!(chunks, vec![(date(2024, 3, 1), date(2024, 3, 31))]);
    }
}
