//! Shared HTTP client construction for the feed collaborators

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::FeedsConfig;

/// Plain client with the configured timeout and user agent
pub fn client(config: &FeedsConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.into()))
        .user_agent(config.user_agent.clone())
        .build()
        .context("Failed to create HTTP client")
}

/// Client that retries transient failures with exponential backoff
///
/// Only used for advisory, idempotent lookups (weather, geocoding).
pub fn retrying_client(config: &FeedsConfig) -> Result<ClientWithMiddleware> {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
    Ok(ClientBuilder::new(client(config)?)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
