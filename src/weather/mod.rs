//! Weather collaborators
//!
//! Both providers return an hourly series; the departure hour is picked
//! with [`WeatherSeries::sample_for`].

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{FeedsConfig, WeatherProviderKind};
use crate::models::{Coordinate, Departure, WeatherSample, WeatherSeries};

pub mod nws;
pub mod open_meteo;

pub use nws::NwsClient;
pub use open_meteo::OpenMeteoClient;

/// Source of hourly wind and humidity forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Hourly samples for `point`, earliest first
    async fn hourly_forecast(&self, point: &Coordinate) -> Result<WeatherSeries>;

    /// Sample for the departure hour, or the first available one
    async fn sample_at(
        &self,
        point: &Coordinate,
        departure: Option<Departure>,
    ) -> Result<WeatherSample> {
        let series = self.hourly_forecast(point).await?;
        Ok(series.sample_for(departure))
    }
}

/// Build the configured weather provider
pub fn provider(config: &FeedsConfig) -> Result<Arc<dyn WeatherProvider>> {
    Ok(match config.weather_provider {
        WeatherProviderKind::Nws => Arc::new(NwsClient::new(config)?),
        WeatherProviderKind::OpenMeteo => Arc::new(OpenMeteoClient::new(config)?),
    })
}
