//! NASA POWER daily archive client.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::config::PredictorConfig;
use crate::core::{HistorySeries, HistorySeriesBuilder, WeatherVariable};
use crate::error::{PredictError, Result};
use crate::history::{synthetic_history, year_chunks, HistoryProvider};

const BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";
const USER_AGENT: &str = concat!("raincast/", env!("CARGO_PKG_VERSION"));

/// Sentinel the POWER archive uses for days without an observation.
const FILL_VALUE: f64 = -999.0;

/// Client for the POWER `temporal/daily/point` endpoint.
///
/// Requests are split into calendar-year chunks. A chunk that keeps
/// failing after the configured retries, or that comes back without
/// data, is replaced by deterministic synthetic history so a forecast
/// is always possible.
pub struct PowerClient {
    client: Client,
    timeout: Duration,
    retry_count: u32,
    retry_backoff: Duration,
}

impl PowerClient {
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
    ) -> Result<PowerResponse> {
        let codes = variables
            .iter()
            .map(|v| v.code())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{BASE_URL}?parameters={codes}&community=SB&latitude={latitude}\
             &longitude={longitude}&start={start}&end={end}&format=JSON",
            start = start.format("%Y%m%d"),
            end = end.format("%Y%m%d"),
        );
        info!("Requesting POWER daily data from {url}");

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
            .json::<PowerResponse>()
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
    ) -> Result<PowerResponse> {
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
                    warn!("POWER attempt {attempt}/{attempts} failed for {start}..{end}: {e}");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for PowerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryProvider for PowerClient {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        variables: &[WeatherVariable],
    ) -> Result<HistorySeries> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let mut builder = HistorySeriesBuilder::new(variables);

        for (from, to) in year_chunks(start, end) {
            match self
                .fetch_chunk_with_retry(latitude, longitude, from, to, variables)
                .await
            {
                // A response whose parameter maps are empty, unknown or
                // unparseable merges nothing and counts as no data.
                Ok(body) => match merge_chunk(&mut builder, &body) {
                    0 => {
                        warn!("POWER returned no usable data for {from}..{to}; using synthetic data");
                        merge_synthetic(&mut builder, latitude, longitude, from, to, variables)?;
                    }
                    points => info!("Merged {points} POWER samples for {from}..{to}"),
                },
                Err(e) => {
                    warn!("POWER request failed for {from}..{to}: {e}; using synthetic data");
                    merge_synthetic(&mut builder, latitude, longitude, from, to, variables)?;
                }
            }
        }

        Ok(builder.build())
    }
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    /// Variable code to `YYYYMMDD`-keyed daily values; the archive
    /// serializes unavailable days as `null`.
    #[serde(default)]
    parameter: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

/// Merge one decoded chunk into the builder, mapping archive fill
/// values and nulls to NaN. Returns the number of points taken.
fn merge_chunk(builder: &mut HistorySeriesBuilder, body: &PowerResponse) -> usize {
    let mut points = 0;
    for (code, days) in &body.properties.parameter {
        let Some(variable) = WeatherVariable::from_code(code) else {
            continue;
        };
        for (day, value) in days {
            let Ok(date) = NaiveDate::parse_from_str(day, "%Y%m%d") else {
                continue;
            };
            let value = match value {
                Some(v) if *v != FILL_VALUE => *v,
                _ => f64::NAN,
            };
            builder.set(date, variable, value);
            points += 1;
        }
    }
    points
}

fn merge_synthetic(
    builder: &mut HistorySeriesBuilder,
    latitude: f64,
    longitude: f64,
    start: NaiveDate,
    end: NaiveDate,
    variables: &[WeatherVariable],
) -> Result<()> {
    let series = synthetic_history(latitude, longitude, start, end, variables)?;
    for (i, date) in series.dates().iter().enumerate() {
        for variable in series.variables() {
            if let Some(column) = series.column(*variable) {
                builder.set(*date, *variable, column[i]);
            }
        }
    }
    Ok(())
}
