//! Address geocoding via Nominatim

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::FeedsConfig;
use crate::models::Coordinate;

/// Resolves free-text addresses to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the address matched nothing
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// OpenStreetMap Nominatim search client
pub struct NominatimClient {
    client: ClientWithMiddleware,
    search_url: String,
}

impl NominatimClient {
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        Ok(Self {
            client: crate::http::retrying_client(config)?,
            search_url: config.geocode_url.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(name = "geocode", skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>> {
        let url = format!(
            "{}?q={}&format=json&limit=1&addressdetails=0",
            self.search_url,
            urlencoding::encode(query)
        );

        let places: Vec<NominatimPlace> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| "Geocoding request failed")?
            .error_for_status()
            .with_context(|| "Geocoder returned an error status")?
            .json()
            .await
            .with_context(|| "Failed to parse geocoding response")?;

        let coordinate = first_coordinate(&places)?;
        debug!("Geocoded '{}' to {:?}", query, coordinate);
        Ok(coordinate)
    }
}

fn first_coordinate(places: &[NominatimPlace]) -> Result<Option<Coordinate>> {
    let Some(place) = places.first() else {
        return Ok(None);
    };
    let lat: f64 = place.lat.parse().context("Geocoder returned a malformed latitude")?;
    let lon: f64 = place.lon.parse().context("Geocoder returned a malformed longitude")?;
    Ok(Some(Coordinate::new(lat, lon)?))
}
