//! Coordinate model for geographic points

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{Get2WurkError, Result};

/// WGS84 point in decimal degrees
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, -90..=90
    pub lat: f64,
    /// Longitude in decimal degrees, -180..=180
    pub lon: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let coordinate = Self { lat, lon };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check latitude and longitude ranges
    ///
    /// Deserialized coordinates bypass [`Coordinate::new`], so request
    /// handlers call this explicitly.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Get2WurkError::validation(format!(
                "latitude {} must be between -90 and 90",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Get2WurkError::validation(format!(
                "longitude {} must be between -180 and 180",
                self.lon
            )));
        }
        Ok(())
    }

    /// Format as `lat,lon` with four decimals
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lon)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = Get2WurkError;

    fn from_str(s: &str) -> Result<Self> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| Get2WurkError::validation(format!("expected LAT,LON, got '{s}'")))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| Get2WurkError::validation(format!("invalid latitude '{lat}'")))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| Get2WurkError::validation(format!("invalid longitude '{lon}'")))?;
        Self::new(lat, lon)
    }
}
