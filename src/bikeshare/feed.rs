//! GBFS station feeds
//!
//! Raw `station_information` and `station_status` snapshots and the HTTP
//! client that fetches them. Counts stay optional here; the merge in
//! [`super::StationIndex`] turns them into fully typed stations.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::config::FeedsConfig;
use crate::models::Coordinate;

/// GBFS envelope: `{"data": {"stations": [...]}}`
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot<T> {
    pub data: SnapshotData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotData<T> {
    #[serde(default = "Vec::new")]
    pub stations: Vec<T>,
}

impl<T> Snapshot<T> {
    #[must_use]
    pub fn new(stations: Vec<T>) -> Self {
        Self {
            data: SnapshotData { stations },
        }
    }
}

/// Static station metadata
#[derive(Debug, Clone, Deserialize)]
pub struct StationInformationRecord {
    pub station_id: String,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl StationInformationRecord {
    /// Location, when both coordinates are present and in range
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        let (lat, lon) = self.lat.zip(self.lon)?;
        Coordinate::new(lat, lon).ok()
    }
}

/// Live station counts
#[derive(Debug, Clone, Deserialize)]
pub struct StationStatusRecord {
    pub station_id: String,
    pub num_bikes_available: Option<u32>,
    pub num_ebikes_available: Option<u32>,
    pub num_docks_available: Option<u32>,
}

pub type StationInformation = Snapshot<StationInformationRecord>;
pub type StationStatus = Snapshot<StationStatusRecord>;

/// Source of the two station snapshots for one request
#[async_trait]
pub trait StationFeedProvider: Send + Sync {
    async fn fetch_snapshots(&self) -> Result<(StationInformation, StationStatus)>;
}

/// Fetches both snapshots from a GBFS base URL
pub struct GbfsClient {
    client: reqwest::Client,
    info_url: String,
    status_url: String,
}

impl GbfsClient {
    /// Create a client for the configured GBFS system
    ///
    /// Station feeds are not retried: a failure is reported to the caller,
    /// who may retry the whole request.
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let client = crate::http::client(config)?;
        let base = config.gbfs_base_url.trim_end_matches('/');

        Ok(Self {
            client,
            info_url: format!("{base}/station_information.json"),
            status_url: format!("{base}/station_status.json"),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GBFS request: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse GBFS response from {url}"))
    }
}

#[async_trait]
impl StationFeedProvider for GbfsClient {
    #[instrument(name = "fetch_gbfs", skip(self))]
    async fn fetch_snapshots(&self) -> Result<(StationInformation, StationStatus)> {
        let (info, status) = tokio::try_join!(
            self.get_json::<StationInformation>(&self.info_url),
            self.get_json::<StationStatus>(&self.status_url),
        )?;

        info!(
            "Fetched {} station records and {} status records",
            info.data.stations.len(),
            status.data.stations.len()
        );
        Ok((info, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_station_information() {
        let json = r#"{
            "last_updated": 1714560000,
            "data": {"stations": [
                {"station_id": "66db237e", "name": "W 52 St & 11 Ave", "lat": 40.767, "lon": -73.993, "capacity": 55},
                {"station_id": "bare"}
            ]}
        }"#;
        let info: StationInformation = serde_json::from_str(json).unwrap();
        assert_eq!(info.data.stations.len(), 2);
        assert_eq!(
            info.data.stations[0].coordinate(),
            Some(Coordinate { lat: 40.767, lon: -73.993 })
        );
        assert_eq!(info.data.stations[1].coordinate(), None);
    }

    #[test]
    fn test_parse_station_status_with_missing_counts() {
        let json = r#"{"data": {"stations": [
            {"station_id": "66db237e", "num_bikes_available": 7, "num_ebikes_available": 2, "num_docks_available": 40, "is_renting": 1},
            {"station_id": "legacy", "num_bikes_available": 3, "num_docks_available": 1}
        ]}}"#;
        let status: StationStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.data.stations[0].num_ebikes_available, Some(2));
        assert_eq!(status.data.stations[1].num_ebikes_available, None);
    }

    #[test]
    fn test_out_of_range_coordinate_is_dropped() {
        let record = StationInformationRecord {
            station_id: "bad".to_string(),
            name: None,
            lat: Some(140.0),
            lon: Some(0.0),
        };
        assert_eq!(record.coordinate(), None);
    }

    #[test]
    fn test_client_builds_feed_urls() {
        let mut config = crate::config::Get2WurkConfig::default().feeds;
        config.gbfs_base_url = "https://gbfs.example.com/gbfs/en/".to_string();
        let client = GbfsClient::new(&config).unwrap();
        assert_eq!(
            client.info_url,
            "https://gbfs.example.com/gbfs/en/station_information.json"
        );
        assert_eq!(
            client.status_url,
            "https://gbfs.example.com/gbfs/en/station_status.json"
        );
    }
}
