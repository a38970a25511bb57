//! Open-Meteo hourly forecast client
//!
//! Unlike NWS, Open-Meteo reports precipitation amounts, so samples from
//! this provider carry a meaningful precipitation flag.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::WeatherProvider;
use crate::config::FeedsConfig;
use crate::models::{Coordinate, TimedSample, WeatherSample, WeatherSeries};

/// Hourly forecast response from Open-Meteo
#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: Option<HourlyData>,
}

/// Parallel hourly arrays; any entry may be null
#[derive(Debug, Deserialize)]
struct HourlyData {
    time: Vec<String>,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: Option<Vec<Option<f64>>>,
    #[serde(rename = "wind_direction_10m")]
    wind_direction: Option<Vec<Option<f64>>>,
    #[serde(rename = "relative_humidity_2m")]
    relative_humidity: Option<Vec<Option<f64>>>,
    precipitation: Option<Vec<Option<f64>>>,
}

/// Client for the Open-Meteo forecast API
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        Ok(Self {
            client: crate::http::retrying_client(config)?,
            base_url: config.open_meteo_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(name = "fetch_open_meteo_hourly", skip(self))]
    async fn hourly_forecast(&self, point: &Coordinate) -> Result<WeatherSeries> {
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&hourly=wind_speed_10m,wind_direction_10m,relative_humidity_2m,precipitation&wind_speed_unit=mph&timezone=auto&forecast_days=2",
            self.base_url, point.lat, point.lon
        );
        debug!("Open-Meteo request URL: {}", url);

        let response: ForecastResponse = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| "Open-Meteo request failed")?
            .error_for_status()
            .with_context(|| "Open-Meteo returned an error status")?
            .json()
            .await
            .with_context(|| "Failed to parse Open-Meteo forecast response")?;

        let series = to_series(&response);
        info!("Retrieved {} Open-Meteo hourly samples", series.samples.len());
        Ok(series)
    }
}

pub(crate) fn to_series(response: &ForecastResponse) -> WeatherSeries {
    let Some(hourly) = &response.hourly else {
        return WeatherSeries::default();
    };

    let value_at = |values: &Option<Vec<Option<f64>>>, i: usize| {
        values.as_ref().and_then(|v| v.get(i).copied().flatten())
    };

    // Requested with timezone=auto: times are local wall-clock at the point
    let offset = FixedOffset::east_opt(response.utc_offset_seconds).unwrap_or_else(|| Utc.fix());

    let samples = hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| TimedSample {
            start: NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
                .ok()
                .and_then(|t| offset.from_local_datetime(&t).single()),
            sample: WeatherSample {
                wind_speed_mph: value_at(&hourly.wind_speed, i),
                wind_direction_from_deg: value_at(&hourly.wind_direction, i),
                humidity_pct: value_at(&hourly.relative_humidity, i),
                is_precipitation: value_at(&hourly.precipitation, i).is_some_and(|mm| mm > 0.0),
            },
        })
        .collect();

    WeatherSeries::new(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_response_to_series() {
        let json = r#"{
            "latitude": 40.76,
            "longitude": -73.98,
            "utc_offset_seconds": -14400,
            "hourly": {
                "time": ["2025-05-01T14:00", "2025-05-01T15:00"],
                "wind_speed_10m": [12.4, null],
                "wind_direction_10m": [180, 200],
                "relative_humidity_2m": [40, 85],
                "precipitation": [0.0, 0.6]
            }
        }"#;
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        let series = to_series(&response);

        assert_eq!(series.samples.len(), 2);
        assert_eq!(
            series.samples[1].start.map(|t| t.to_rfc3339()).as_deref(),
            Some("2025-05-01T15:00:00-04:00")
        );
        assert_eq!(series.samples[0].sample.wind_speed_mph, Some(12.4));
        assert!(!series.samples[0].sample.is_precipitation);
        assert_eq!(series.samples[1].sample.wind_speed_mph, None);
        assert_eq!(series.samples[1].sample.humidity_pct, Some(85.0));
        assert!(series.samples[1].sample.is_precipitation);
    }

    #[test]
    fn test_missing_hourly_block() {
        let response: ForecastResponse = serde_json::from_str(r#"{"latitude": 1.0}"#).unwrap();
        assert!(to_series(&response).samples.is_empty());
    }

    #[test]
    fn test_missing_variable_arrays() {
        let response: ForecastResponse =
            serde_json::from_str(r#"{"hourly": {"time": ["2025-05-01T14:00"]}}"#).unwrap();
        let series = to_series(&response);
        assert_eq!(series.samples[0].sample, WeatherSample::default());
    }
}
