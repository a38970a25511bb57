//! Transit service alerts
//!
//! Reads a GTFS-realtime alerts feed in its JSON rendering and keeps the
//! English header text of each alert.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::FeedsConfig;

/// Source of human-readable transit alerts
#[async_trait]
pub trait AlertsProvider: Send + Sync {
    async fn fetch_alerts(&self) -> Result<Vec<String>>;
}

/// Used when no alerts feed is configured
pub struct NoAlerts;

#[async_trait]
impl AlertsProvider for NoAlerts {
    async fn fetch_alerts(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedMessage {
    #[serde(default)]
    entity: Vec<FeedEntity>,
}

#[derive(Debug, Deserialize)]
struct FeedEntity {
    alert: Option<Alert>,
}

#[derive(Debug, Deserialize)]
struct Alert {
    header_text: Option<TranslatedString>,
}

#[derive(Debug, Deserialize)]
struct TranslatedString {
    #[serde(default)]
    translation: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
    language: Option<String>,
}

/// HTTP client for a GTFS-realtime JSON alerts feed
pub struct GtfsAlertsClient {
    client: reqwest::Client,
    url: String,
}

impl GtfsAlertsClient {
    pub fn new(config: &FeedsConfig, url: &str) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(config)?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl AlertsProvider for GtfsAlertsClient {
    #[instrument(name = "fetch_transit_alerts", skip(self))]
    async fn fetch_alerts(&self) -> Result<Vec<String>> {
        let feed: FeedMessage = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| "Alerts request failed")?
            .error_for_status()
            .with_context(|| "Alerts feed returned an error status")?
            .json()
            .await
            .with_context(|| "Failed to parse alerts feed")?;

        let alerts = headlines(&feed);
        info!("Retrieved {} transit alerts", alerts.len());
        Ok(alerts)
    }
}

/// English (or untagged) header texts, de-duplicated, in feed order
pub(crate) fn headlines(feed: &FeedMessage) -> Vec<String> {
    let mut seen = Vec::new();
    for header in feed
        .entity
        .iter()
        .filter_map(|entity| entity.alert.as_ref()?.header_text.as_ref())
    {
        let text = english_text(&header.translation);
        if let Some(text) = text {
            if !text.is_empty() && !seen.iter().any(|s: &String| s == text) {
                seen.push(text.to_string());
            }
        }
    }
    seen
}

/// Plain `en` or untagged text first; `en-*` variants such as `en-html`
/// only when neither exists
fn english_text(translations: &[Translation]) -> Option<&str> {
    let plain = translations.iter().find(|t| {
        t.language
            .as_deref()
            .is_none_or(|lang| lang.eq_ignore_ascii_case("en"))
    });
    let variant = || {
        translations.iter().find(|t| {
            t.language
                .as_deref()
                .is_some_and(|lang| lang.to_ascii_lowercase().starts_with("en-"))
        })
    };
    plain.or_else(variant).map(|t| t.text.trim())
}

/// Build the configured alerts provider
pub fn provider(config: &FeedsConfig) -> Result<std::sync::Arc<dyn AlertsProvider>> {
    Ok(match &config.alerts_url {
        Some(url) => std::sync::Arc::new(GtfsAlertsClient::new(config, url)?),
        None => std::sync::Arc::new(NoAlerts),
    })
}
