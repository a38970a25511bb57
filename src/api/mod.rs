use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::Get2WurkError;
use crate::models::{
    BikeType, Coordinate, Departure, Preferences, Rationale, RecommendationResult,
};
use crate::recommendation::{RecommendationService, TripRequest};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// OpenAPI document served at `/api/openapi.json`
#[derive(OpenApi)]
#[openapi(
    paths(health, recommend, recommend_addr),
    components(schemas(
        RecommendRequest,
        RecommendAddrRequest,
        RecommendResponse,
        HealthResponse,
        ErrorResponse
    )),
    modifiers(&ApiKeyAuth),
    security(("ApiKeyAuth" = [])),
    info(
        title = "GET2WURK API",
        description = "Bike or transit commute recommendations from live weather, bikeshare inventory and transit alerts"
    )
)]
pub struct ApiDoc;

struct ApiKeyAuth;

impl Modify for ApiKeyAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "ApiKeyAuth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
        );
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecommendRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// RFC 3339 instant, or a local date-time without offset
    #[schema(value_type = Option<String>, example = "2025-06-02T08:30:00-04:00")]
    pub depart_at: Option<Departure>,
    #[serde(default)]
    pub prefs: Preferences,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecommendAddrRequest {
    #[schema(example = "Rockefeller Center, New York")]
    pub origin_addr: String,
    pub destination_addr: String,
    #[schema(value_type = Option<String>, example = "2025-06-02T08:30:00")]
    pub depart_at: Option<Departure>,
    #[serde(default)]
    pub prefs: Preferences,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecommendResponse {
    pub recommendation: String,
    pub bike_type: BikeType,
    pub summary: String,
    pub plan_b: Option<String>,
    pub rationale: Rationale,
}

impl From<RecommendationResult> for RecommendResponse {
    fn from(result: RecommendationResult) -> Self {
        Self {
            recommendation: result.recommendation,
            bike_type: result.bike_type,
            summary: result.summary,
            plan_b: result.plan_b,
            rationale: result.rationale,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. `upstream_unavailable`
    pub error: String,
    pub detail: String,
}

/// Failure returned by an API handler or the authorization layer
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Service(Get2WurkError),
}

impl From<Get2WurkError> for ApiError {
    fn from(err: Get2WurkError) -> Self {
        Self::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Service(Get2WurkError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing or invalid API key".to_string(),
            ),
            ApiError::Service(err) => {
                let status = match &err {
                    Get2WurkError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    Get2WurkError::NotFound { .. } => StatusCode::NOT_FOUND,
                    Get2WurkError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
                    Get2WurkError::Config { .. } | Get2WurkError::Io { .. } => {
                        tracing::error!("Request failed: {err}");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.code(), err.user_message())
            }
        };
        let body = ErrorResponse {
            error: code.to_string(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(service: Arc<RecommendationService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/openapi.json", get(openapi_json))
        .route("/recommend", post(recommend))
        .route("/recommend_addr", post(recommend_addr))
        .with_state(service)
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/health",
    security(()),
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Recommend a mode for a trip between two coordinates
#[utoipa::path(
    post,
    path = "/api/recommend",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Recommendation", body = RecommendResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 404, description = "No station near an endpoint", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Station feed unavailable", body = ErrorResponse),
    )
)]
async fn recommend(
    State(service): State<Arc<RecommendationService>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(request) = payload?;
    let trip = TripRequest::new(request.origin, request.destination)
        .depart_at(request.depart_at)
        .with_prefs(request.prefs);

    let result = service.recommend(trip).await?;
    Ok(Json(result.into()))
}

/// Geocode two addresses, then recommend as for coordinates
#[utoipa::path(
    post,
    path = "/api/recommend_addr",
    request_body = RecommendAddrRequest,
    responses(
        (status = 200, description = "Recommendation", body = RecommendResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 404, description = "Address or nearby station not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Station feed or geocoder unavailable", body = ErrorResponse),
    )
)]
async fn recommend_addr(
    State(service): State<Arc<RecommendationService>>,
    payload: Result<Json<RecommendAddrRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(request) = payload?;
    let result = service
        .recommend_addresses(
            &request.origin_addr,
            &request.destination_addr,
            request.depart_at,
            request.prefs,
        )
        .await?;
    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(Get2WurkError::validation("lat 91"), StatusCode::UNPROCESSABLE_ENTITY, "invalid_input")]
    #[case(Get2WurkError::not_found("no stations"), StatusCode::NOT_FOUND, "not_found")]
    #[case(Get2WurkError::upstream("Station feed", "503"), StatusCode::BAD_GATEWAY, "upstream_unavailable")]
    #[case(Get2WurkError::config("bad"), StatusCode::INTERNAL_SERVER_ERROR, "config")]
    #[tokio::test]
    async fn test_error_status_mapping(
        #[case] err: Get2WurkError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), status);
        assert_eq!(body_json(response).await["error"], code);
    }

    #[tokio::test]
    async fn test_unauthorized_body() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }

    #[test]
    fn test_openapi_document() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(doc["info"]["title"], "GET2WURK API");
        assert_eq!(doc["info"]["version"], crate::VERSION);
        assert_eq!(doc["security"], serde_json::json!([{"ApiKeyAuth": []}]));

        let scheme = &doc["components"]["securitySchemes"]["ApiKeyAuth"];
        assert_eq!(scheme["type"], "apiKey");
        assert_eq!(scheme["in"], "header");
        assert_eq!(scheme["name"], "X-API-Key");

        for path in ["/api/health", "/api/recommend", "/api/recommend_addr"] {
            assert!(doc["paths"].get(path).is_some(), "{path} missing");
        }
        assert!(doc["components"]["schemas"].get("RecommendResponse").is_some());
    }

    #[test]
    fn test_request_defaults_prefs() {
        let request: RecommendRequest = serde_json::from_str(
            r#"{"origin":{"lat":40.758,"lon":-73.985},"destination":{"lat":40.748,"lon":-73.985}}"#,
        )
        .unwrap();
        assert_eq!(request.prefs, Preferences::default());
        assert!(request.depart_at.is_none());
    }

    #[test]
    fn test_request_parses_offset_departure() {
        let request: RecommendAddrRequest = serde_json::from_str(
            r#"{"origin_addr":"a","destination_addr":"b","depart_at":"2025-06-02T08:30:00-04:00"}"#,
        )
        .unwrap();
        assert_eq!(request.depart_at.unwrap().to_string(), "2025-06-02T12:30:00Z");
    }

    #[test]
    fn test_request_accepts_local_departure() {
        let request: RecommendRequest = serde_json::from_str(
            r#"{"origin":{"lat":40.758,"lon":-73.985},"destination":{"lat":40.748,"lon":-73.985},"depart_at":"2025-06-02T08:30:00"}"#,
        )
        .unwrap();
        assert!(matches!(request.depart_at, Some(Departure::Local(_))));
    }

    #[test]
    fn test_request_rejects_unparseable_departure() {
        let result = serde_json::from_str::<RecommendAddrRequest>(
            r#"{"origin_addr":"a","destination_addr":"b","depart_at":"after lunch"}"#,
        );
        assert!(result.is_err());
    }
}
