use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, API_KEY_HEADER, ApiError};
use crate::config::{Get2WurkConfig, ServerConfig};
use crate::recommendation::RecommendationService;

/// Routes served without an API key
const PUBLIC_PATHS: [&str; 2] = ["/api/health", "/api/openapi.json"];

/// Build the application router around an already constructed service
pub fn app(service: Arc<RecommendationService>, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_key: Option<Arc<str>> = server.api_key.as_deref().map(Arc::from);

    Router::new()
        .nest("/api", api::router(service))
        .layer(middleware::from_fn_with_state(api_key, require_api_key))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_seconds.into()),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn require_api_key(
    State(expected): State<Option<Arc<str>>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided == Some(&*expected) {
        next.run(request).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}

pub async fn run(config: &Get2WurkConfig) -> Result<()> {
    let service = Arc::new(RecommendationService::from_config(config)?);
    let app = app(service, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        auth = config.server.api_key.is_some(),
        "Web server running at http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
