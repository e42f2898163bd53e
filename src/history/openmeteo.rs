//! Open-Meteo historical archive client.
//!
//! Open-Meteo serves reanalysis data at roughly 10 km resolution,
//! much finer than POWER's ~50 km cells, so the chained provider
//! queries it first. The archive lags a few days behind the present
//! and reports wind in km/h; both quirks are normalized here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::config::PredictorConfig;
use crate::core::{HistorySeries, HistorySeriesBuilder, WeatherVariable};
use crate::error::{PredictError, Result};
use crate::history::{year_chunks, HistoryProvider};

const BASE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
const USER_AGENT: &str = concat!("raincast/", env!("CARGO_PKG_VERSION"));

/// Days the archive trails behind the current date.
const AVAILABILITY_LAG_DAYS: i64 = 5;

/// The archive reports wind in km/h; the pipeline works in m/s.
const KMH_TO_MS: f64 = 1.0 / 3.6;

/// Client for the Open-Meteo `v1/archive` endpoint.
///
/// Requests are split into calendar-year chunks; a chunk that keeps
/// failing after the configured retries is skipped rather than
/// substituted, so a caller can fall back to another archive when the
/// whole range comes back empty.
pub struct OpenMeteoClient {
    client: Client,
    timeout: Duration,
    retry_count: u32,
    retry_backoff: Duration,
}

impl OpenMeteoClient {
    /// Create a client with the default network settings.
    pub fn new() -> Self {
        Self::with_config(&PredictorConfig::default())
    }

    /// Create a client using the network settings of `config`.
    pub fn with_config(config: &PredictorConfig) -> Self {
        Self {
            client: Client::new(),
            timeout: config.request_timeout,
            retry_count: config.retry_count.max(1),
            retry_backoff: config.retry_backoff,
        }
    }

    async fn fetch_chunk(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        variables: &[WeatherVariable],
    ) -> Result<OpenMeteoResponse> {
        let daily = variables
            .iter()
            .map(|v| daily_parameter(*v))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{BASE_URL}?latitude={latitude}&longitude={longitude}\
             &start_date={start}&end_date={end}&daily={daily}&timezone=auto",
        );
        info!("Requesting Open-Meteo daily data from {url}");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PredictError::Upstream {
                url: url.clone(),
                source: e,
            })?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => PredictError::Status { url, status },
                    None => PredictError::Upstream { url, source: e },
                });
            }
        };

        response
            .json::<OpenMeteoResponse>()
            .await
            .map_err(|e| PredictError::Decode { url, source: e })
    }

    async fn fetch_chunk_with_retry(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        variables: &[WeatherVariable],
    ) -> Result<OpenMeteoResponse> {
        let attempts = self.retry_count;
        let mut attempt = 1;
        loop {
            match self
                .fetch_chunk(latitude, longitude, start, end, variables)
                .await
            {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if attempt >= attempts {
                        return Err(e);
                    }
                    warn!("Open-Meteo attempt {attempt}/{attempts} failed for {start}..{end}: {e}");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryProvider for OpenMeteoClient {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        variables: &[WeatherVariable],
    ) -> Result<HistorySeries> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let end = end.min(availability_cutoff(Utc::now().date_naive()));
        if start > end {
            return Err(PredictError::NoArchiveData { start, end });
        }

        let mut builder = HistorySeriesBuilder::new(variables);
        let mut points = 0;
        for (from, to) in year_chunks(start, end) {
            match self
                .fetch_chunk_with_retry(latitude, longitude, from, to, variables)
                .await
            {
                Ok(body) => match merge_chunk(&mut builder, &body, variables) {
                    0 => warn!("Open-Meteo returned no usable data for {from}..{to}"),
                    merged => {
                        info!("Merged {merged} Open-Meteo samples for {from}..{to}");
                        points += merged;
                    }
                },
                // One bad year does not sink the range.
                Err(e) => warn!("Open-Meteo request failed for {from}..{to}: {e}"),
            }
        }

        if points == 0 {
            return Err(PredictError::NoArchiveData { start, end });
        }
        Ok(builder.build())
    }
}

/// The archive's daily parameter name for a variable.
fn daily_parameter(variable: WeatherVariable) -> &'static str {
    match variable {
        WeatherVariable::T2m => "temperature_2m_mean",
        WeatherVariable::T2mMax => "temperature_2m_max",
        WeatherVariable::T2mMin => "temperature_2m_min",
        WeatherVariable::Ws10m => "windspeed_10m_max",
        WeatherVariable::Prectotcorr => "precipitation_sum",
    }
}

/// Latest day the archive can be expected to hold, given `today`.
fn availability_cutoff(today: NaiveDate) -> NaiveDate {
    today - chrono::Duration::days(AVAILABILITY_LAG_DAYS)
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    daily: OpenMeteoDaily,
}

/// Column-oriented daily block: every parameter array aligns with `time`.
#[derive(Debug, Default, Deserialize)]
struct OpenMeteoDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

impl OpenMeteoDaily {
    fn column(&self, variable: WeatherVariable) -> &[Option<f64>] {
        match variable {
            WeatherVariable::T2m => &self.temperature_2m_mean,
            WeatherVariable::T2mMax => &self.temperature_2m_max,
            WeatherVariable::T2mMin => &self.temperature_2m_min,
            WeatherVariable::Ws10m => &self.windspeed_10m_max,
            WeatherVariable::Prectotcorr => &self.precipitation_sum,
        }
    }
}

/// Merge one decoded chunk into the builder, mapping nulls to NaN and
/// converting wind to m/s. Returns the number of points taken.
fn merge_chunk(
    builder: &mut HistorySeriesBuilder,
    body: &OpenMeteoResponse,
    variables: &[WeatherVariable],
) -> usize {
    let mut points = 0;
    for (i, day) in body.daily.time.iter().enumerate() {
        let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
            continue;
        };
        for &variable in variables {
            let column = body.daily.column(variable);
            let Some(value) = column.get(i) else {
                continue;
            };
            let value = match value {
                Some(v) if variable == WeatherVariable::Ws10m => v * KMH_TO_MS,
                Some(v) => *v,
                None => f64::NAN,
            };
            builder.set(date, variable, value);
            points += 1;
        }
    }
    points
}
