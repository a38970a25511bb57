//! Weather sample model and hourly sample selection

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, DurationRound, FixedOffset, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::Get2WurkError;

/// 16-point compass rose, clockwise from north in 22.5 degree steps
const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Wind and humidity conditions for one forecast hour
///
/// Every field is nullable: a collaborator that failed, or that does not
/// report a quantity, leaves it empty and the decision engine substitutes
/// neutral values.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WeatherSample {
    /// Sustained wind speed in mph
    pub wind_speed_mph: Option<f64>,
    /// Compass bearing the wind blows from (0-360)
    pub wind_direction_from_deg: Option<f64>,
    /// Relative humidity in percent
    pub humidity_pct: Option<f64>,
    #[serde(default)]
    pub is_precipitation: bool,
}

impl WeatherSample {
    /// Wind speed and direction, when both are reported
    #[must_use]
    pub fn wind(&self) -> Option<(f64, f64)> {
        self.wind_speed_mph.zip(self.wind_direction_from_deg)
    }

    /// Map a compass abbreviation such as `SSW` to degrees
    #[must_use]
    pub fn cardinal_to_degrees(cardinal: &str) -> Option<f64> {
        let cardinal = cardinal.trim().to_ascii_uppercase();
        COMPASS_POINTS
            .iter()
            .position(|point| *point == cardinal)
            .map(|index| index as f64 * 22.5)
    }

    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn degrees_to_cardinal(degrees: f64) -> &'static str {
        let sector = (degrees.rem_euclid(360.0) / 22.5).round() as usize % COMPASS_POINTS.len();
        COMPASS_POINTS[sector]
    }

    /// Format wind information, e.g. `12 mph from S`
    #[must_use]
    pub fn format_wind(&self) -> String {
        match self.wind() {
            Some((speed, from)) => {
                format!("{speed:.0} mph from {}", Self::degrees_to_cardinal(from))
            }
            None => "wind unknown".to_string(),
        }
    }
}

/// Requested departure time
///
/// Times given with an offset are absolute instants. Times without one are
/// wall-clock times at the trip's location and are matched against the
/// local hour of each forecast period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Departure {
    At(DateTime<Utc>),
    Local(NaiveDateTime),
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl FromStr for Departure {
    type Err = Get2WurkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::At(instant.with_timezone(&Utc)));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
            .map(Self::Local)
            .ok_or_else(|| {
                Get2WurkError::validation(format!(
                    "depart_at '{s}' is not an ISO 8601 date-time"
                ))
            })
    }
}

impl TryFrom<String> for Departure {
    type Error = Get2WurkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Departure::At(instant) => {
                f.write_str(&instant.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Departure::Local(local) => write!(f, "{}", local.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<Departure> for String {
    fn from(departure: Departure) -> Self {
        departure.to_string()
    }
}

impl From<DateTime<Utc>> for Departure {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::At(instant)
    }
}

impl Departure {
    /// Whether a forecast period starting at `start` covers this departure
    #[must_use]
    pub fn matches_hour(&self, start: &DateTime<FixedOffset>) -> bool {
        match self {
            Departure::At(instant) => {
                truncate_to_hour(start.with_timezone(&Utc)) == truncate_to_hour(*instant)
            }
            Departure::Local(local) => {
                truncate_to_hour(start.naive_local()) == truncate_to_hour(*local)
            }
        }
    }
}

/// A sample together with the start of the hour it describes
///
/// `start` keeps the forecast location's UTC offset so local departures
/// can be matched on wall-clock hours.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSample {
    pub start: Option<DateTime<FixedOffset>>,
    pub sample: WeatherSample,
}

/// Ordered hourly samples returned by a weather collaborator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSeries {
    pub samples: Vec<TimedSample>,
}

impl WeatherSeries {
    #[must_use]
    pub fn new(samples: Vec<TimedSample>) -> Self {
        Self { samples }
    }

    /// Pick the sample for the departure hour
    ///
    /// Without a departure time, or without a matching hour, the first
    /// sample is used; an empty series yields an all-null sample.
    #[must_use]
    pub fn sample_for(&self, departure: Option<Departure>) -> WeatherSample {
        let matched = departure.and_then(|departure| {
            self.samples.iter().find(|timed| {
                timed
                    .start
                    .as_ref()
                    .is_some_and(|start| departure.matches_hour(start))
            })
        });

        matched
            .or_else(|| self.samples.first())
            .map(|timed| timed.sample.clone())
            .unwrap_or_default()
    }
}

fn truncate_to_hour<T: DurationRound + Copy>(time: T) -> T {
    time.duration_trunc(TimeDelta::hours(1)).unwrap_or(time)
}
