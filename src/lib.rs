//! GET2WURK - bike or transit commute recommendations
//!
//! Combines live bikeshare availability, the hourly weather forecast and
//! transit alerts into one recommendation: which bike to take, from which
//! station, or whether to take transit or walk instead.

pub mod alerts;
pub mod api;
pub mod bikeshare;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod http;
pub mod logging;
pub mod models;
pub mod recommendation;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::Get2WurkConfig;
pub use error::Get2WurkError;
pub use models::{
    BikeType, Coordinate, Preferences, Rationale, RecommendationResult, RuleTriggered, Station,
    WeatherSample,
};
pub use recommendation::{Collaborators, DecisionEngine, RecommendationService, TripRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, Get2WurkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
