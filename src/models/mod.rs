//! Data models for the GET2WURK service
//!
//! This module contains the core domain models organized by concern:
//! - Location: validated geographic coordinates
//! - Station: merged bikeshare station records
//! - Weather: hourly wind and humidity samples
//! - Recommendation: caller preferences and the decision returned to them

pub mod location;
pub mod recommendation;
pub mod station;
pub mod weather;

// Re-export all public types for convenient access
pub use location::Coordinate;
pub use recommendation::{BikeType, Preferences, Rationale, RecommendationResult, RuleTriggered};
pub use station::Station;
pub use weather::{Departure, TimedSample, WeatherSample, WeatherSeries};
