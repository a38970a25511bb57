//! Origin availability fallback
//!
//! Repairs the selector's verdict against the live inventory at the origin
//! station. Working states are the bike types; `None` is terminal.
//!
//! - `Ebike` with no e-bikes at the origin: move to the nearest station with
//!   e-bikes inside the radius, else drop to `Classic` if the origin has
//!   classic bikes, else `None`.
//! - `Classic` with no classic bikes at the origin: upgrade to `Ebike` if the
//!   origin has e-bikes, else take whichever of the nearest e-bike and
//!   nearest classic stations is closer (classic on a tie), else `None`.

use crate::bikeshare::{AvailabilityResolver, Capability};
use crate::models::{BikeType, Coordinate, Station};

/// Outcome of the origin fallback
#[derive(Debug, Clone, PartialEq)]
pub struct OriginResolution<'a> {
    pub bike_type: BikeType,
    pub station: &'a Station,
    /// What was changed and why; `None` when the first choice stood
    pub note: Option<String>,
}

impl<'a> OriginResolution<'a> {
    fn unchanged(bike_type: BikeType, station: &'a Station) -> Self {
        Self {
            bike_type,
            station,
            note: None,
        }
    }

    fn changed(bike_type: BikeType, station: &'a Station, note: String) -> Self {
        Self {
            bike_type,
            station,
            note: Some(note),
        }
    }
}

/// Run the fallback for the chosen `bike_type` at `origin_station`
#[must_use]
pub fn resolve_origin<'a>(
    bike_type: BikeType,
    origin: &Coordinate,
    origin_station: &'a Station,
    resolver: &AvailabilityResolver<'a>,
    max_radius_m: f64,
) -> OriginResolution<'a> {
    match bike_type {
        BikeType::Ebike if !origin_station.has_ebikes() => {
            ebike_fallback(origin, origin_station, resolver, max_radius_m)
        }
        BikeType::Classic if !origin_station.has_classic() => {
            classic_fallback(origin, origin_station, resolver, max_radius_m)
        }
        _ => OriginResolution::unchanged(bike_type, origin_station),
    }
}

fn ebike_fallback<'a>(
    origin: &Coordinate,
    origin_station: &'a Station,
    resolver: &AvailabilityResolver<'a>,
    max_radius_m: f64,
) -> OriginResolution<'a> {
    if let Some((station, distance)) =
        resolver.nearest_with_capability(origin, Capability::Ebikes, max_radius_m)
    {
        return OriginResolution::changed(
            BikeType::Ebike,
            station,
            format!(
                "No e-bikes at {}; nearest e-bike is at {} ({distance:.0} m away).",
                origin_station.display_name(),
                station.display_name()
            ),
        );
    }

    if origin_station.has_classic() {
        return OriginResolution::changed(
            BikeType::Classic,
            origin_station,
            format!(
                "No e-bikes within {max_radius_m:.0} m; substituted a classic bike at {}.",
                origin_station.display_name()
            ),
        );
    }

    no_bikes(origin_station, max_radius_m)
}

fn classic_fallback<'a>(
    origin: &Coordinate,
    origin_station: &'a Station,
    resolver: &AvailabilityResolver<'a>,
    max_radius_m: f64,
) -> OriginResolution<'a> {
    if origin_station.has_ebikes() {
        return OriginResolution::changed(
            BikeType::Ebike,
            origin_station,
            "No classic bikes at origin; upgraded to e-bike.".to_string(),
        );
    }

    let ebike = resolver.nearest_with_capability(origin, Capability::Ebikes, max_radius_m);
    let classic = resolver.nearest_with_capability(origin, Capability::ClassicBikes, max_radius_m);

    let pick = match (classic, ebike) {
        (Some(c), Some(e)) if c.1 <= e.1 => Some((BikeType::Classic, c)),
        (Some(_), Some(e)) => Some((BikeType::Ebike, e)),
        (Some(c), None) => Some((BikeType::Classic, c)),
        (None, Some(e)) => Some((BikeType::Ebike, e)),
        (None, None) => None,
    };

    match pick {
        Some((bike_type, (station, distance))) => OriginResolution::changed(
            bike_type,
            station,
            format!(
                "No bikes at {}; nearest {} is at {} ({distance:.0} m away).",
                origin_station.display_name(),
                bike_type.label(),
                station.display_name()
            ),
        ),
        None => no_bikes(origin_station, max_radius_m),
    }
}

fn no_bikes(origin_station: &Station, max_radius_m: f64) -> OriginResolution<'_> {
    OriginResolution::changed(
        BikeType::None,
        origin_station,
        format!("No bikes available within {max_radius_m:.0} m of the origin."),
    )
}
