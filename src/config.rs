//! Configuration management for the GET2WURK service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::Get2WurkError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Get2WurkConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// External feed endpoints and client behaviour
    #[serde(default)]
    pub feeds: FeedsConfig,
    /// Decision policy constants
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Required `X-API-Key` value; no key means the API is open
    pub api_key: Option<String>,
    /// Upper bound for a whole request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

/// Which weather collaborator to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherProviderKind {
    Nws,
    OpenMeteo,
}

/// External feed endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_gbfs_base_url")]
    pub gbfs_base_url: String,
    #[serde(default = "default_weather_provider")]
    pub weather_provider: WeatherProviderKind,
    #[serde(default = "default_nws_base_url")]
    pub nws_base_url: String,
    #[serde(default = "default_open_meteo_base_url")]
    pub open_meteo_base_url: String,
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    /// GTFS-realtime alerts in JSON form; none configured means no alerts
    pub alerts_url: Option<String>,
    /// Per-collaborator timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout_seconds: u32,
    /// Retries for weather and geocoding requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Decision policy constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum walk to an alternative station, in meters
    #[serde(default = "default_search_radius")]
    pub search_radius_m: f64,
    /// Free docks an alternative destination station must have
    #[serde(default = "default_min_docks")]
    pub min_docks: u32,
    /// Below this many free docks the destination gets an advisory note
    #[serde(default = "default_low_docks_threshold")]
    pub low_docks_threshold: u32,
    /// Humidity assumed when the weather feed has none
    #[serde(default = "default_neutral_humidity")]
    pub neutral_humidity_pct: f64,
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u32 {
    30
}

fn default_gbfs_base_url() -> String {
    "https://gbfs.citibikenyc.com/gbfs/en".to_string()
}

fn default_weather_provider() -> WeatherProviderKind {
    WeatherProviderKind::Nws
}

fn default_nws_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocode_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_feed_timeout() -> u32 {
    15
}

fn default_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("GET2WURK/{}", crate::VERSION)
}

fn default_search_radius() -> f64 {
    crate::bikeshare::DEFAULT_SEARCH_RADIUS_M
}

fn default_min_docks() -> u32 {
    crate::bikeshare::DEFAULT_MIN_DOCKS
}

fn default_low_docks_threshold() -> u32 {
    3
}

fn default_neutral_humidity() -> f64 {
    50.0
}

fn default_max_alerts() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            gbfs_base_url: default_gbfs_base_url(),
            weather_provider: default_weather_provider(),
            nws_base_url: default_nws_base_url(),
            open_meteo_base_url: default_open_meteo_base_url(),
            geocode_url: default_geocode_url(),
            alerts_url: None,
            timeout_seconds: default_feed_timeout(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            search_radius_m: default_search_radius(),
            min_docks: default_min_docks(),
            low_docks_threshold: default_low_docks_threshold(),
            neutral_humidity_pct: default_neutral_humidity(),
            max_alerts: default_max_alerts(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Get2WurkConfig {
    /// Load configuration from `get2wurk.toml` and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(Self::get_config_path);
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. GET2WURK__SERVER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("GET2WURK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: Get2WurkConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Default configuration file in the working directory
    #[must_use]
    pub fn get_config_path() -> PathBuf {
        PathBuf::from("get2wurk.toml")
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.feeds.gbfs_base_url.is_empty() {
            self.feeds.gbfs_base_url = default_gbfs_base_url();
        }
        if self.feeds.timeout_seconds == 0 {
            self.feeds.timeout_seconds = default_feed_timeout();
        }
        if self.feeds.user_agent.is_empty() {
            self.feeds.user_agent = default_user_agent();
        }
        if self.feeds.alerts_url.as_deref().is_some_and(str::is_empty) {
            self.feeds.alerts_url = None;
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.server.api_key {
            if api_key.trim().is_empty() {
                return Err(Get2WurkError::config(
                    "API key cannot be empty if provided. Either remove it or set a value.",
                )
                .into());
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.feeds.timeout_seconds > 300 {
            return Err(Get2WurkError::config("Feed timeout cannot exceed 300 seconds").into());
        }

        if self.feeds.max_retries > 10 {
            return Err(Get2WurkError::config("Feed max retries cannot exceed 10").into());
        }

        if self.server.request_timeout_seconds > 600 {
            return Err(Get2WurkError::config("Request timeout cannot exceed 600 seconds").into());
        }

        if !(self.policy.search_radius_m > 0.0 && self.policy.search_radius_m <= 10_000.0) {
            return Err(Get2WurkError::config(
                "Search radius must be greater than 0 and at most 10000 m",
            )
            .into());
        }

        if !(0.0..=100.0).contains(&self.policy.neutral_humidity_pct) {
            return Err(
                Get2WurkError::config("Neutral humidity must be between 0 and 100").into(),
            );
        }

        // An alternative station must not itself be low on docks
        if self.policy.min_docks < self.policy.low_docks_threshold {
            return Err(Get2WurkError::config(format!(
                "min_docks ({}) must be at least low_docks_threshold ({})",
                self.policy.min_docks, self.policy.low_docks_threshold
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(Get2WurkError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(Get2WurkError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("gbfs_base_url", Some(&self.feeds.gbfs_base_url)),
            ("nws_base_url", Some(&self.feeds.nws_base_url)),
            ("open_meteo_base_url", Some(&self.feeds.open_meteo_base_url)),
            ("geocode_url", Some(&self.feeds.geocode_url)),
            ("alerts_url", self.feeds.alerts_url.as_ref()),
        ];
        for (name, url) in urls {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(Get2WurkError::config(format!(
                        "{name} must be a valid HTTP or HTTPS URL"
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }
}
