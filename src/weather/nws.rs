//! National Weather Service hourly forecast client
//!
//! Two requests: `/points/{lat},{lon}` yields the grid's hourly forecast
//! URL, which is then fetched for its periods.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use super::WeatherProvider;
use crate::config::FeedsConfig;
use crate::models::{Coordinate, TimedSample, WeatherSample, WeatherSeries};

/// Words in `shortForecast` that indicate falling precipitation
const PRECIPITATION_WORDS: [&str; 7] = [
    "rain", "shower", "drizzle", "snow", "sleet", "storm", "flurries",
];

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    forecast_hourly: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HourlyResponse {
    properties: HourlyProperties,
}

#[derive(Debug, Deserialize)]
struct HourlyProperties {
    #[serde(default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Period {
    start_time: Option<String>,
    wind_speed: Option<String>,
    wind_direction: Option<String>,
    relative_humidity: Option<QuantitativeValue>,
    short_forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuantitativeValue {
    value: Option<f64>,
}

/// Client for `api.weather.gov`
pub struct NwsClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl NwsClient {
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        Ok(Self {
            client: crate::http::retrying_client(config)?,
            base_url: config.nws_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("NWS request: {}", url);
        self.client
            .get(url)
            .header("Accept", "application/geo+json")
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse NWS response from {url}"))
    }
}

#[async_trait]
impl WeatherProvider for NwsClient {
    #[instrument(name = "fetch_nws_hourly", skip(self))]
    async fn hourly_forecast(&self, point: &Coordinate) -> Result<WeatherSeries> {
        let points_url = format!("{}/points/{:.4},{:.4}", self.base_url, point.lat, point.lon);
        let points: PointsResponse = self.get_json(&points_url).await?;
        let hourly_url = points
            .properties
            .forecast_hourly
            .ok_or_else(|| anyhow!("NWS grid point has no hourly forecast"))?;

        let hourly: HourlyResponse = self.get_json(&hourly_url).await?;
        let series = to_series(hourly);
        info!("Retrieved {} NWS hourly periods", series.samples.len());
        Ok(series)
    }
}

pub(crate) fn to_series(response: HourlyResponse) -> WeatherSeries {
    WeatherSeries::new(
        response
            .properties
            .periods
            .into_iter()
            .map(|period| TimedSample {
                start: period
                    .start_time
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok()),
                sample: WeatherSample {
                    wind_speed_mph: Some(parse_wind_speed(period.wind_speed.as_deref())),
                    wind_direction_from_deg: Some(parse_wind_direction(
                        period.wind_direction.as_deref(),
                    )),
                    humidity_pct: period.relative_humidity.and_then(|rh| rh.value),
                    is_precipitation: period
                        .short_forecast
                        .as_deref()
                        .is_some_and(mentions_precipitation),
                },
            })
            .collect(),
    )
}

/// `"10 mph"` or `"10 to 15 mph"` to the highest figure; unparseable is calm
fn parse_wind_speed(text: Option<&str>) -> f64 {
    text.unwrap_or_default()
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|token| token.parse::<u32>().ok())
        .max()
        .map_or(0.0, f64::from)
}

/// Compass text such as `"SSW"`, or a numeric bearing; unparseable is north
fn parse_wind_direction(text: Option<&str>) -> f64 {
    let text = text.unwrap_or("N");
    WeatherSample::cardinal_to_degrees(text)
        .or_else(|| text.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn mentions_precipitation(forecast: &str) -> bool {
    let forecast = forecast.to_lowercase();
    PRECIPITATION_WORDS
        .iter()
        .any(|word| forecast.contains(word))
}
