//! Router tests through the full middleware stack

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use get2wurk::alerts::NoAlerts;
use get2wurk::bikeshare::feed::{StationInformationRecord, StationStatusRecord};
use get2wurk::bikeshare::{StationFeedProvider, StationInformation, StationStatus};
use get2wurk::config::{PolicyConfig, ServerConfig};
use get2wurk::geocode::Geocoder;
use get2wurk::models::WeatherSeries;
use get2wurk::weather::WeatherProvider;
use get2wurk::{Collaborators, Coordinate, RecommendationService};

const API_KEY: &str = "commute-secret";

struct CalmWeather;

#[async_trait]
impl WeatherProvider for CalmWeather {
    async fn hourly_forecast(&self, _point: &Coordinate) -> Result<WeatherSeries> {
        Ok(WeatherSeries::default())
    }
}

struct Stations {
    down: bool,
}

struct StalledStations;

#[async_trait]
impl StationFeedProvider for StalledStations {
    async fn fetch_snapshots(&self) -> Result<(StationInformation, StationStatus)> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Stations { down: false }.fetch_snapshots().await
    }
}

#[async_trait]
impl StationFeedProvider for Stations {
    async fn fetch_snapshots(&self) -> Result<(StationInformation, StationStatus)> {
        if self.down {
            anyhow::bail!("connection refused");
        }
        let info = StationInformation::new(vec![StationInformationRecord {
            station_id: "1".to_string(),
            name: Some("Broadway & W 41 St".to_string()),
            lat: Some(40.7550),
            lon: Some(-73.9868),
        }]);
        let status = StationStatus::new(vec![StationStatusRecord {
            station_id: "1".to_string(),
            num_bikes_available: Some(10),
            num_ebikes_available: Some(4),
            num_docks_available: Some(15),
        }]);
        Ok((info, status))
    }
}

struct TimesSquareOnly;

#[async_trait]
impl Geocoder for TimesSquareOnly {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>> {
        Ok((query == "Times Square").then_some(Coordinate { lat: 40.758, lon: -73.9855 }))
    }
}

fn app(stations_down: bool) -> Router {
    let server = ServerConfig {
        api_key: Some(API_KEY.to_string()),
        ..ServerConfig::default()
    };
    app_with(Arc::new(Stations { down: stations_down }), Duration::from_secs(1), &server)
}

fn app_with(
    stations: Arc<dyn StationFeedProvider>,
    fetch_timeout: Duration,
    server: &ServerConfig,
) -> Router {
    let service = RecommendationService::new(
        Collaborators {
            weather: Arc::new(CalmWeather),
            stations,
            alerts: Arc::new(NoAlerts),
            geocoder: Arc::new(TimesSquareOnly),
        },
        PolicyConfig::default(),
        fetch_timeout,
    );
    get2wurk::web::app(Arc::new(service), server)
}

fn post(uri: &str, body: Value, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn trip_body() -> Value {
    json!({
        "origin": {"lat": 40.758, "lon": -73.985},
        "destination": {"lat": 40.748, "lon": -73.985}
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_needs_no_key() {
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let response = app(false).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let request = Request::builder().uri("/api/openapi.json").body(Body::empty()).unwrap();
    let response = app(false).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let doc = read_json(response).await;
    assert_eq!(doc["info"]["title"], "GET2WURK API");
    assert_eq!(doc["info"]["version"], get2wurk::VERSION);
    assert_eq!(doc["security"][0]["ApiKeyAuth"], json!([]));
    let scheme = &doc["components"]["securitySchemes"]["ApiKeyAuth"];
    assert_eq!(scheme["in"], "header");
    assert_eq!(scheme["name"], "X-API-Key");
    assert!(doc["paths"]["/api/recommend"]["post"].is_object());
    assert!(doc["paths"]["/api/recommend_addr"]["post"].is_object());
}

#[tokio::test]
async fn test_slow_request_times_out_with_408() {
    let server = ServerConfig {
        api_key: Some(API_KEY.to_string()),
        request_timeout_seconds: 1,
        ..ServerConfig::default()
    };
    let app = app_with(Arc::new(StalledStations), Duration::from_secs(5), &server);
    let response = app
        .oneshot(post("/api/recommend", trip_body(), Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn test_missing_or_wrong_key_is_unauthorized() {
    let response = app(false)
        .oneshot(post("/api/recommend", trip_body(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(false)
        .oneshot(post("/api/recommend", trip_body(), Some("guess")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn test_recommend_returns_full_response() {
    let response = app(false)
        .oneshot(post("/api/recommend", trip_body(), Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["bike_type"], "classic");
    assert_eq!(body["rationale"]["rule_triggered"], "below_thresholds");
    assert_eq!(body["rationale"]["citibike_origin"]["station_id"], "1");
    assert!(body["recommendation"].as_str().unwrap().starts_with("Take a classic bike"));
}

#[tokio::test]
async fn test_out_of_range_coordinate_is_unprocessable() {
    let body = json!({
        "origin": {"lat": 91.0, "lon": -73.985},
        "destination": {"lat": 40.748, "lon": -73.985}
    });
    let response = app(false)
        .oneshot(post("/api/recommend", body, Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await["error"], "invalid_input");
}

#[tokio::test]
async fn test_malformed_body_is_unprocessable() {
    let response = app(false)
        .oneshot(post("/api/recommend", json!({"origin": "here"}), Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_station_outage_is_bad_gateway() {
    let response = app(true)
        .oneshot(post("/api/recommend", trip_body(), Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert_eq!(body["error"], "upstream_unavailable");
    assert!(!body["detail"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn test_unknown_address_is_not_found() {
    let body = json!({"origin_addr": "Times Square", "destination_addr": "Nowhere Lane"});
    let response = app(false)
        .oneshot(post("/api/recommend_addr", body, Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["detail"], "Address not found: Nowhere Lane");
}

#[tokio::test]
async fn test_recommend_by_address() {
    let body = json!({"origin_addr": "Times Square", "destination_addr": "Times Square"});
    let response = app(false)
        .oneshot(post("/api/recommend_addr", body, Some(API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
