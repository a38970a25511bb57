//! Caller preferences and the recommendation returned for one request

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Station, WeatherSample};
use crate::{Get2WurkError, Result};

/// Travel preferences supplied with a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Preferences {
    pub bike_allowed: bool,
    pub transit_allowed: bool,
    /// Headwind in mph at or above which an e-bike is chosen
    pub ebike_headwind_threshold_mph: f64,
    /// Relative humidity at or above which an e-bike is chosen
    pub humidity_threshold_pct: f64,
    /// Destination station to prefer over the nearest one, matched by name
    #[serde(alias = "preferred_destination_station_name")]
    pub preferred_dest_station_name: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            bike_allowed: true,
            transit_allowed: true,
            ebike_headwind_threshold_mph: 9.0,
            humidity_threshold_pct: 80.0,
            preferred_dest_station_name: None,
        }
    }
}

impl Preferences {
    /// Reject thresholds that would make the selector meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.ebike_headwind_threshold_mph.is_finite() {
            return Err(Get2WurkError::validation(
                "ebike_headwind_threshold_mph must be a finite number",
            ));
        }
        if !(0.0..=100.0).contains(&self.humidity_threshold_pct) {
            return Err(Get2WurkError::validation(format!(
                "humidity_threshold_pct {} must be between 0 and 100",
                self.humidity_threshold_pct
            )));
        }
        Ok(())
    }
}

/// Bike type verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BikeType {
    Classic,
    Ebike,
    None,
}

impl BikeType {
    #[must_use]
    pub fn is_bike(self) -> bool {
        !matches!(self, BikeType::None)
    }

    /// Noun used in recommendation text
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BikeType::Classic => "classic bike",
            BikeType::Ebike => "e-bike",
            BikeType::None => "no bike",
        }
    }
}

impl fmt::Display for BikeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BikeType::Classic => "classic",
            BikeType::Ebike => "ebike",
            BikeType::None => "none",
        };
        f.write_str(s)
    }
}

/// Rule that determined the final mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleTriggered {
    /// Headwind met the e-bike threshold
    HeadwindThreshold,
    /// Humidity met the e-bike threshold
    HumidityThreshold,
    /// Neither threshold met
    BelowThresholds,
    /// Fallback changed the selector's verdict at the origin
    OriginFallback,
    /// No bike was available within the search radius
    NoBikesAvailable,
    BikeNotAllowed,
}

/// Everything the decision was based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rationale {
    pub wind_speed_mph: Option<f64>,
    pub wind_direction_from_deg: Option<f64>,
    pub headwind_mph: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub is_precipitation: Option<bool>,
    pub bearing_deg: f64,
    pub rule_triggered: RuleTriggered,
    pub citibike_origin: Option<Station>,
    pub citibike_destination: Option<Station>,
    /// Station with spare docks near the destination, when docks are short
    pub dock_alternative: Option<Station>,
    /// Fallback and degradation notes, in the order they were raised
    pub notes: Vec<String>,
    pub alerts: Vec<String>,
}

impl Rationale {
    pub(crate) fn from_weather(weather: &WeatherSample, bearing_deg: f64) -> Self {
        Self {
            wind_speed_mph: weather.wind_speed_mph,
            wind_direction_from_deg: weather.wind_direction_from_deg,
            headwind_mph: None,
            humidity_pct: weather.humidity_pct,
            is_precipitation: Some(weather.is_precipitation),
            bearing_deg,
            rule_triggered: RuleTriggered::BelowThresholds,
            citibike_origin: None,
            citibike_destination: None,
            dock_alternative: None,
            notes: Vec::new(),
            alerts: Vec::new(),
        }
    }
}

/// Final answer for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendation: String,
    pub bike_type: BikeType,
    pub summary: String,
    pub plan_b: Option<String>,
    pub rationale: Rationale,
}
