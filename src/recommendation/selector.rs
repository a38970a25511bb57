//! Bike type selection from headwind and humidity
//!
//! A crisp threshold rule with no hysteresis: headwinds of 8.99 and 9.0 mph
//! against a 9 mph threshold give different answers. Thresholds are
//! user-configured, so the boundary is exactly where the user put it.

use crate::models::{BikeType, Preferences, RuleTriggered};

/// Threshold pair taken from the caller's preferences
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BikeTypeSelector {
    pub headwind_threshold_mph: f64,
    pub humidity_threshold_pct: f64,
}

impl BikeTypeSelector {
    #[must_use]
    pub fn new(headwind_threshold_mph: f64, humidity_threshold_pct: f64) -> Self {
        Self {
            headwind_threshold_mph,
            humidity_threshold_pct,
        }
    }

    #[must_use]
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self::new(prefs.ebike_headwind_threshold_mph, prefs.humidity_threshold_pct)
    }

    /// E-bike when either threshold is met, classic otherwise
    #[must_use]
    pub fn select(&self, headwind_mph: f64, humidity_pct: f64) -> BikeType {
        match self.rule(headwind_mph, humidity_pct) {
            RuleTriggered::BelowThresholds => BikeType::Classic,
            _ => BikeType::Ebike,
        }
    }

    /// Which threshold decided; headwind is reported when both are met
    #[must_use]
    pub fn rule(&self, headwind_mph: f64, humidity_pct: f64) -> RuleTriggered {
        if headwind_mph >= self.headwind_threshold_mph {
            RuleTriggered::HeadwindThreshold
        } else if humidity_pct >= self.humidity_threshold_pct {
            RuleTriggered::HumidityThreshold
        } else {
            RuleTriggered::BelowThresholds
        }
    }
}
