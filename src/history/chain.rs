//! Provider chaining: prefer one archive, fall back to another.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;

use crate::config::PredictorConfig;
use crate::core::{HistorySeries, WeatherVariable};
use crate::error::Result;
use crate::history::{HistoryProvider, OpenMeteoClient, PowerClient};

/// Tries `primary` first and falls back to `fallback` when the primary
/// fails or returns a series with no observed values.
pub struct ChainedProvider<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> ChainedProvider<P, F> {
    /// Chain two providers.
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl ChainedProvider<OpenMeteoClient, PowerClient> {
    /// The default archive chain: Open-Meteo (~10 km resolution) first,
    /// NASA POWER (~50 km, itself degrading to synthetic data) second.
    pub fn archive(config: &PredictorConfig) -> Self {
        Self::new(
            OpenMeteoClient::with_config(config),
            PowerClient::with_config(config),
        )
    }
}

#[async_trait]
impl<P, F> HistoryProvider for ChainedProvider<P, F>
where
    P: HistoryProvider,
    F: HistoryProvider,
{
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        variables: &[WeatherVariable],
    ) -> Result<HistorySeries> {
        match self
            .primary
            .fetch(latitude, longitude, start, end, variables)
            .await
        {
            Ok(series) if !series.without_blank_rows().is_empty() => Ok(series),
            Ok(_) => {
                warn!("Primary archive returned no observations; trying fallback");
                self.fallback
                    .fetch(latitude, longitude, start, end, variables)
                    .await
            }
            Err(e) => {
                warn!("Primary archive failed: {e}; trying fallback");
                self.fallback
                    .fetch(latitude, longitude, start, end, variables)
                    .await
            }
        }
    }
}
