//! Request orchestration
//!
//! Fans out to the weather, station and alerts collaborators concurrently,
//! each bounded by its own timeout, then hands the results to the
//! [`DecisionEngine`]. The fetches are joined in place rather than spawned,
//! so dropping the request future cancels them all.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{info, instrument, warn};

use super::{Conditions, DecisionEngine, TripRequest};
use crate::alerts::{self, AlertsProvider};
use crate::bikeshare::{GbfsClient, StationFeedProvider, StationIndex};
use crate::config::{Get2WurkConfig, PolicyConfig};
use crate::geocode::{Geocoder, NominatimClient};
use crate::models::{Coordinate, Departure, Preferences, RecommendationResult};
use crate::weather::{self, WeatherProvider};
use crate::{Get2WurkError, Result};

const WEATHER_UNAVAILABLE_NOTE: &str =
    "Weather unavailable; assuming calm wind and neutral humidity.";
const ALERTS_UNAVAILABLE_NOTE: &str = "Transit alerts unavailable.";

/// External collaborators the service depends on
#[derive(Clone)]
pub struct Collaborators {
    pub weather: Arc<dyn WeatherProvider>,
    pub stations: Arc<dyn StationFeedProvider>,
    pub alerts: Arc<dyn AlertsProvider>,
    pub geocoder: Arc<dyn Geocoder>,
}

impl Collaborators {
    /// Production collaborators built from configuration
    pub fn from_config(config: &Get2WurkConfig) -> anyhow::Result<Self> {
        Ok(Self {
            weather: weather::provider(&config.feeds)?,
            stations: Arc::new(GbfsClient::new(&config.feeds)?),
            alerts: alerts::provider(&config.feeds)?,
            geocoder: Arc::new(NominatimClient::new(&config.feeds)?),
        })
    }
}

/// Produces recommendations for trips given as coordinates or addresses
#[derive(Clone)]
pub struct RecommendationService {
    collaborators: Collaborators,
    engine: DecisionEngine,
    fetch_timeout: Duration,
}

impl RecommendationService {
    pub fn new(collaborators: Collaborators, policy: PolicyConfig, fetch_timeout: Duration) -> Self {
        Self {
            collaborators,
            engine: DecisionEngine::new(policy),
            fetch_timeout,
        }
    }

    pub fn from_config(config: &Get2WurkConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            Collaborators::from_config(config)?,
            config.policy.clone(),
            Duration::from_secs(config.feeds.timeout_seconds.into()),
        ))
    }

    /// Recommend a mode for a trip between two coordinates
    #[instrument(
        name = "recommend",
        skip(self, trip),
        fields(origin = %trip.origin.format_coordinates(), destination = %trip.destination.format_coordinates())
    )]
    pub async fn recommend(&self, trip: TripRequest) -> Result<RecommendationResult> {
        trip.validate()?;

        let Collaborators {
            weather,
            stations,
            alerts,
            ..
        } = &self.collaborators;

        let (weather_result, stations_result, alerts_result) = tokio::join!(
            self.bounded(weather.sample_at(&trip.origin, trip.depart_at)),
            self.bounded(stations.fetch_snapshots()),
            self.bounded(alerts.fetch_alerts()),
        );

        let (info, status) = stations_result.map_err(|e| {
            warn!("Station feed failed: {e:#}");
            Get2WurkError::upstream("Station feed", format!("{e:#}"))
        })?;
        let index = StationIndex::from_feeds(&info, &status);

        let mut conditions = Conditions::default();
        match weather_result {
            Ok(sample) => conditions.weather = sample,
            Err(e) => {
                warn!("Weather fetch failed, using neutral conditions: {e:#}");
                conditions.notes.push(WEATHER_UNAVAILABLE_NOTE.to_string());
            }
        }
        match alerts_result {
            Ok(mut list) => {
                list.truncate(self.engine.policy().max_alerts);
                conditions.alerts = list;
            }
            Err(e) => {
                warn!("Alerts fetch failed: {e:#}");
                conditions.notes.push(ALERTS_UNAVAILABLE_NOTE.to_string());
            }
        }

        let result = self.engine.decide(&trip, &index, conditions)?;
        info!(
            bike_type = %result.bike_type,
            rule = ?result.rationale.rule_triggered,
            stations = index.len(),
            "Recommendation ready"
        );
        Ok(result)
    }

    /// Geocode both addresses, then recommend as for coordinates
    #[instrument(name = "recommend_addresses", skip(self, prefs))]
    pub async fn recommend_addresses(
        &self,
        origin_addr: &str,
        destination_addr: &str,
        depart_at: Option<Departure>,
        prefs: Preferences,
    ) -> Result<RecommendationResult> {
        for (field, value) in [("origin_addr", origin_addr), ("destination_addr", destination_addr)] {
            if value.trim().is_empty() {
                return Err(Get2WurkError::validation(format!("{field} must not be empty")));
            }
        }

        let (origin, destination) =
            tokio::try_join!(self.geocode(origin_addr), self.geocode(destination_addr))?;

        let trip = TripRequest::new(origin, destination)
            .depart_at(depart_at)
            .with_prefs(prefs);
        self.recommend(trip).await
    }

    async fn geocode(&self, address: &str) -> Result<Coordinate> {
        match self
            .bounded(self.collaborators.geocoder.geocode(address.trim()))
            .await
        {
            Ok(Some(coordinate)) => Ok(coordinate),
            Ok(None) => Err(Get2WurkError::not_found(format!(
                "Address not found: {}",
                address.trim()
            ))),
            Err(e) => {
                warn!("Geocoding '{address}' failed: {e:#}");
                Err(Get2WurkError::upstream("Geocoder", format!("{e:#}")))
            }
        }
    }

    /// Apply the per-collaborator timeout, folding elapsed into the error
    async fn bounded<T, F>(&self, fetch: F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| anyhow!("timed out after {}s", self.fetch_timeout.as_secs_f64()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bikeshare::feed::{StationInformationRecord, StationStatusRecord};
    use crate::bikeshare::{StationInformation, StationStatus};
    use crate::models::{BikeType, WeatherSeries};
    use async_trait::async_trait;

    struct StubWeather;

    #[async_trait]
    impl WeatherProvider for StubWeather {
        async fn hourly_forecast(&self, _point: &Coordinate) -> anyhow::Result<WeatherSeries> {
            anyhow::bail!("forecast offline")
        }
    }

    struct StubStations {
        fail: bool,
    }

    #[async_trait]
    impl StationFeedProvider for StubStations {
        async fn fetch_snapshots(&self) -> anyhow::Result<(StationInformation, StationStatus)> {
            if self.fail {
                anyhow::bail!("HTTP 503");
            }
            let info = StationInformation::new(vec![StationInformationRecord {
                station_id: "1".to_string(),
                name: Some("W 52 St & 6 Ave".to_string()),
                lat: Some(40.761),
                lon: Some(-73.979),
            }]);
            let status = StationStatus::new(vec![StationStatusRecord {
                station_id: "1".to_string(),
                num_bikes_available: Some(6),
                num_ebikes_available: Some(2),
                num_docks_available: Some(20),
            }]);
            Ok((info, status))
        }
    }

    struct SlowAlerts;

    #[async_trait]
    impl AlertsProvider for SlowAlerts {
        async fn fetch_alerts(&self) -> anyhow::Result<Vec<String>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec!["never".to_string()])
        }
    }

    struct StubGeocoder;

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, query: &str) -> anyhow::Result<Option<Coordinate>> {
            Ok((query == "Rockefeller Center").then_some(Coordinate {
                lat: 40.7587,
                lon: -73.9787,
            }))
        }
    }

    fn service(fail_stations: bool) -> RecommendationService {
        RecommendationService::new(
            Collaborators {
                weather: Arc::new(StubWeather),
                stations: Arc::new(StubStations { fail: fail_stations }),
                alerts: Arc::new(SlowAlerts),
                geocoder: Arc::new(StubGeocoder),
            },
            PolicyConfig::default(),
            Duration::from_millis(50),
        )
    }

    fn trip() -> TripRequest {
        TripRequest::new(
            Coordinate { lat: 40.7605, lon: -73.9800 },
            Coordinate { lat: 40.7610, lon: -73.9785 },
        )
    }

    #[tokio::test]
    async fn test_degraded_weather_and_alerts_still_recommend() {
        let result = service(false).recommend(trip()).await.unwrap();
        assert_eq!(result.bike_type, BikeType::Classic);
        assert!(result.rationale.alerts.is_empty());
        assert_eq!(
            result.rationale.notes,
            vec![
                WEATHER_UNAVAILABLE_NOTE.to_string(),
                ALERTS_UNAVAILABLE_NOTE.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_station_failure_is_upstream_error() {
        let err = service(true).recommend(trip()).await.unwrap_err();
        match err {
            Get2WurkError::UpstreamUnavailable { service, message } => {
                assert_eq!(service, "Station feed");
                assert!(message.contains("503"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bounded_keeps_error_chain_and_reports_elapsed() {
        let service = service(false);
        let err = service
            .bounded(async { Err::<(), _>(anyhow!("connection refused").context("Request failed")) })
            .await
            .unwrap_err();
        assert_eq!(format!("{err:#}"), "Request failed: connection refused");

        let err = service
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, anyhow::Error>(())
            })
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("timed out after"), "{err}");
    }

    #[tokio::test]
    async fn test_invalid_coordinates_rejected_before_fetching() {
        let mut bad = trip();
        bad.origin.lat = 95.0;
        let err = service(true).recommend(bad).await.unwrap_err();
        assert!(matches!(err, Get2WurkError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_address_is_not_found() {
        let err = service(false)
            .recommend_addresses("Rockefeller Center", "Atlantis", None, Preferences::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Address not found: Atlantis");
    }

    #[tokio::test]
    async fn test_blank_address_is_invalid() {
        let err = service(false)
            .recommend_addresses("  ", "Rockefeller Center", None, Preferences::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Get2WurkError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_addresses_resolve_and_recommend() {
        let result = service(false)
            .recommend_addresses(
                "Rockefeller Center",
                "Rockefeller Center",
                None,
                Preferences::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            result.rationale.citibike_origin.unwrap().station_id,
            "1"
        );
    }
}
