//! Decision protocol over already-fetched inputs
//!
//! Given a trip, the merged station index, one weather sample and the
//! transit alerts, produce the recommendation. No I/O happens here.

use tracing::debug;

use super::TripRequest;
use super::fallback::resolve_origin;
use super::selector::BikeTypeSelector;
use crate::bikeshare::{AvailabilityResolver, Capability, StationIndex};
use crate::config::PolicyConfig;
use crate::geo;
use crate::models::{
    BikeType, Preferences, Rationale, RecommendationResult, RuleTriggered, Station, WeatherSample,
};
use crate::{Get2WurkError, Result};

/// Collaborator outputs for one request
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    pub weather: WeatherSample,
    pub alerts: Vec<String>,
    /// Degradations met while gathering, e.g. a failed weather fetch
    pub notes: Vec<String>,
}

/// Stateless decision engine configured with policy constants
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    policy: PolicyConfig,
}

impl DecisionEngine {
    #[must_use]
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Run the decision protocol for one trip
    ///
    /// Fails only when no located station exists near either endpoint.
    /// Running out of bikes is a normal outcome that recommends transit or
    /// walking.
    pub fn decide(
        &self,
        trip: &TripRequest,
        index: &StationIndex,
        conditions: Conditions,
    ) -> Result<RecommendationResult> {
        let resolver = AvailabilityResolver::new(index);
        let prefs = &trip.prefs;
        let radius = self.policy.search_radius_m;
        let mut plan_notes = Vec::new();

        let (Some(origin_station), Some(nearest_dest)) = (
            resolver.nearest_any(&trip.origin),
            resolver.nearest_any(&trip.destination),
        ) else {
            return Err(Get2WurkError::not_found("No nearby bike stations found"));
        };

        let dest_station = preferred_destination(&resolver, prefs, &mut plan_notes)
            .unwrap_or(nearest_dest);

        let bearing = geo::bearing_deg(&trip.origin, &trip.destination);
        let headwind = conditions
            .weather
            .wind()
            .map_or(0.0, |(speed, from)| geo::headwind_mph(from, bearing, speed));
        let humidity = conditions
            .weather
            .humidity_pct
            .unwrap_or(self.policy.neutral_humidity_pct);

        let mut rationale = Rationale::from_weather(&conditions.weather, bearing);
        rationale.headwind_mph = Some(headwind);

        let (bike_type, rule, origin_station) = if prefs.bike_allowed {
            let selector = BikeTypeSelector::from_preferences(prefs);
            let selected = selector.select(headwind, humidity);
            let resolution = resolve_origin(selected, &trip.origin, origin_station, &resolver, radius);
            let rule = match resolution.bike_type {
                BikeType::None => RuleTriggered::NoBikesAvailable,
                chosen if chosen != selected => RuleTriggered::OriginFallback,
                _ => selector.rule(headwind, humidity),
            };
            plan_notes.extend(resolution.note);
            (resolution.bike_type, rule, resolution.station)
        } else {
            (BikeType::None, RuleTriggered::BikeNotAllowed, origin_station)
        };

        if bike_type.is_bike() && dest_station.docks_available < self.policy.low_docks_threshold {
            let alternative = resolver.nearest_with_capability(
                &trip.destination,
                Capability::Docks(self.policy.min_docks),
                radius,
            );
            plan_notes.push(dock_note(dest_station, alternative, self.policy.min_docks, radius));
            rationale.dock_alternative = alternative.map(|(station, _)| station.clone());
        }

        debug!(
            bearing,
            headwind,
            humidity,
            %bike_type,
            origin = origin_station.display_name(),
            destination = dest_station.display_name(),
            "Decision reached"
        );

        rationale.rule_triggered = rule;
        rationale.citibike_origin = Some(origin_station.clone());
        rationale.citibike_destination = Some(dest_station.clone());
        rationale.alerts = conditions.alerts;
        rationale.notes = conditions.notes;
        rationale.notes.extend(plan_notes.iter().cloned());

        let text = Composer {
            prefs,
            bike_type,
            rule,
            headwind,
            humidity,
            weather: &conditions.weather,
            origin: origin_station,
            destination: dest_station,
            alerts: &rationale.alerts,
        };

        Ok(RecommendationResult {
            recommendation: text.recommendation(),
            summary: text.summary(),
            plan_b: text.plan_b(&plan_notes),
            bike_type,
            rationale,
        })
    }
}

/// Caller's named destination station, if it exists and can take a bike
fn preferred_destination<'a>(
    resolver: &AvailabilityResolver<'a>,
    prefs: &Preferences,
    notes: &mut Vec<String>,
) -> Option<&'a Station> {
    let name = prefs.preferred_dest_station_name.as_deref()?;
    if name.trim().is_empty() {
        return None;
    }
    match resolver.find_by_name(name) {
        Some(station) if station.docks_available > 0 => Some(station),
        Some(station) => {
            notes.push(format!(
                "Preferred station {} has no free docks; using the nearest station.",
                station.display_name()
            ));
            None
        }
        None => {
            notes.push(format!(
                "Preferred station '{name}' was not found; using the nearest station."
            ));
            None
        }
    }
}

fn dock_note(
    destination: &Station,
    alternative: Option<(&Station, f64)>,
    min_docks: u32,
    radius: f64,
) -> String {
    let docks = destination.docks_available;
    let plural = if docks == 1 { "" } else { "s" };
    match alternative {
        Some((station, distance)) => format!(
            "Only {docks} dock{plural} free at {}; {} has {} free docks ({distance:.0} m from your destination).",
            destination.display_name(),
            station.display_name(),
            station.docks_available
        ),
        None => format!(
            "Only {docks} dock{plural} free at {} and no station within {radius:.0} m has {min_docks}+ free docks.",
            destination.display_name()
        ),
    }
}

/// Turns a decision into user-facing text
struct Composer<'a> {
    prefs: &'a Preferences,
    bike_type: BikeType,
    rule: RuleTriggered,
    headwind: f64,
    humidity: f64,
    weather: &'a WeatherSample,
    origin: &'a Station,
    destination: &'a Station,
    alerts: &'a [String],
}

impl Composer<'_> {
    fn recommendation(&self) -> String {
        match self.bike_type {
            BikeType::Ebike | BikeType::Classic => {
                let article = if self.bike_type == BikeType::Ebike { "an" } else { "a" };
                format!(
                    "Take {article} {} from {} to {}.",
                    self.bike_type.label(),
                    self.origin.display_name(),
                    self.destination.display_name()
                )
            }
            BikeType::None if self.prefs.transit_allowed => "Take transit.".to_string(),
            BikeType::None => "Walk.".to_string(),
        }
    }

    fn summary(&self) -> String {
        let conditions = format!(
            "Conditions: {}, headwind {:+.1} mph, humidity {:.0}%.",
            self.weather.format_wind(),
            self.headwind,
            self.humidity
        );

        let verdict = match self.rule {
            RuleTriggered::HeadwindThreshold => format!(
                "E-bike recommended: headwind meets your {:.1} mph threshold.",
                self.prefs.ebike_headwind_threshold_mph
            ),
            RuleTriggered::HumidityThreshold => format!(
                "E-bike recommended: humidity meets your {:.0}% threshold.",
                self.prefs.humidity_threshold_pct
            ),
            RuleTriggered::BelowThresholds => {
                "Classic bike recommended: conditions are below your e-bike thresholds.".to_string()
            }
            RuleTriggered::OriginFallback => format!(
                "{} recommended: it is what is available near your origin.",
                capitalize(self.bike_type.label())
            ),
            RuleTriggered::NoBikesAvailable => format!(
                "No bikes available near your origin; {}.",
                self.without_bike()
            ),
            RuleTriggered::BikeNotAllowed => format!(
                "Biking is off in your preferences; {}.",
                self.without_bike()
            ),
        };

        let mut summary = format!("{verdict} {conditions}");
        if !self.alerts.is_empty() && !self.bike_type.is_bike() && self.prefs.transit_allowed {
            let plural = if self.alerts.len() == 1 { "" } else { "s" };
            summary.push_str(&format!(
                " {} active transit alert{plural}; check before you go.",
                self.alerts.len()
            ));
        }
        summary
    }

    fn without_bike(&self) -> &'static str {
        if self.prefs.transit_allowed {
            "take transit"
        } else {
            "walking is the remaining option"
        }
    }

    fn plan_b(&self, notes: &[String]) -> Option<String> {
        let mut parts: Vec<String> = notes.to_vec();
        match self.bike_type {
            BikeType::Ebike | BikeType::Classic if self.prefs.transit_allowed => {
                parts.push("If bikes or docks run out, take transit.".to_string());
            }
            BikeType::Ebike | BikeType::Classic => {
                parts.push("If bikes or docks run out, walk.".to_string());
            }
            BikeType::None if self.prefs.transit_allowed => {
                parts.push("If transit is disrupted, walk.".to_string());
            }
            BikeType::None => {}
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
