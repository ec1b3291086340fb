// Open-Meteo repository implementation
use crate::application::weather_repository::WeatherRepository;
use crate::domain::error::FetchError;
use crate::domain::observation::{HourlyObservation, LookbackWindow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const HOURLY_FIELDS: &str = "temperature_2m,windspeed_10m,winddirection_10m";
const FORECAST_DAYS: u8 = 1;
// Provider default is km/h; the dashboard labels wind in m/s
const WINDSPEED_UNIT: &str = "ms";

#[derive(Debug, Clone)]
pub struct OpenMeteoRepository {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    #[serde(default)]
    hourly: Option<HourlySeries>,
}

/// Parallel arrays, one entry per hour. The provider sends `null` for
/// hours it has no value for.
#[derive(Debug, Default, Deserialize)]
struct HourlySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    winddirection_10m: Vec<Option<f64>>,
}

impl OpenMeteoRepository {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn build_forecast_url(
        &self,
        latitude: f64,
        longitude: f64,
        lookback: LookbackWindow,
    ) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&hourly={}&windspeed_unit={}\
             &past_days={}&forecast_days={}&timezone=auto",
            self.base_url,
            latitude,
            longitude,
            urlencoding::encode(HOURLY_FIELDS),
            WINDSPEED_UNIT,
            lookback.past_days(),
            FORECAST_DAYS
        )
    }

    fn map_send_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::ScheduleTimeout(self.timeout)
        } else {
            FetchError::Network(error.to_string())
        }
    }

    async fn execute_query(&self, url: &str) -> Result<ForecastResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Network(format!(
                "Open-Meteo request failed with status {}: {}",
                status, body
            )));
        }

        // Read the body first so a stalled body counts as a timeout rather than a parse error
        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {}", e)))
    }
}

/// Zip the parallel hourly arrays into rows. Hours with a missing value are dropped.
fn parse_hourly(
    city: &str,
    utc_offset_seconds: i32,
    series: HourlySeries,
) -> Result<Vec<HourlyObservation>, FetchError> {
    let len = series.time.len();
    if series.temperature_2m.len() != len
        || series.windspeed_10m.len() != len
        || series.winddirection_10m.len() != len
    {
        return Err(FetchError::MalformedResponse(format!(
            "hourly arrays have inconsistent lengths \
             (time={}, temperature_2m={}, windspeed_10m={}, winddirection_10m={})",
            len,
            series.temperature_2m.len(),
            series.windspeed_10m.len(),
            series.winddirection_10m.len()
        )));
    }

    let offset = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
        FetchError::MalformedResponse(format!("invalid utc_offset_seconds: {}", utc_offset_seconds))
    })?;

    let mut rows = Vec::with_capacity(len);
    let mut previous: Option<DateTime<FixedOffset>> = None;
    let columns = series
        .temperature_2m
        .into_iter()
        .zip(series.windspeed_10m)
        .zip(series.winddirection_10m);

    for (time, ((temperature, wind_speed), wind_direction)) in series.time.iter().zip(columns) {
        let timestamp = parse_local_time(time, offset)?;
        // Hourly axis must be strictly increasing
        if previous.is_some_and(|prev| timestamp <= prev) {
            return Err(FetchError::MalformedResponse(format!(
                "hourly times not strictly increasing at {:?}",
                time
            )));
        }
        previous = Some(timestamp);

        match (temperature, wind_speed, wind_direction) {
            (Some(temperature), Some(wind_speed), Some(wind_direction)) => {
                rows.push(HourlyObservation::new(
                    city,
                    timestamp,
                    temperature,
                    wind_speed,
                    wind_direction,
                ));
            }
            _ => {
                tracing::debug!("Skipping incomplete hour {} for {}", time, city);
            }
        }
    }

    Ok(rows)
}

/// Open-Meteo returns local wall-clock times like `2024-07-10T14:00`
fn parse_local_time(value: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>, FetchError> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| FetchError::MalformedResponse(format!("invalid time {:?}: {}", value, e)))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| FetchError::MalformedResponse(format!("ambiguous local time {:?}", value)))
}

#[async_trait]
impl WeatherRepository for OpenMeteoRepository {
    async fn fetch_hourly(
        &self,
        city: &str,
        latitude: f64,
        longitude: f64,
        lookback: LookbackWindow,
    ) -> Result<Vec<HourlyObservation>, FetchError> {
        let url = self.build_forecast_url(latitude, longitude, lookback);
        tracing::debug!("Fetching hourly weather for {}: {}", city, url);

        let response = self.execute_query(&url).await?;

        let Some(series) = response.hourly.filter(|h| !h.time.is_empty()) else {
            tracing::debug!("No hourly series in response for {}", city);
            return Ok(Vec::new());
        };

        let rows = parse_hourly(city, response.utc_offset_seconds, series)?;
        tracing::debug!("Parsed {} hourly rows for {}", rows.len(), city);
        Ok(rows)
    }
}
