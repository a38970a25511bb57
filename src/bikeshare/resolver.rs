//! Station availability queries
//!
//! Nearest-station searches constrained by what the station can offer
//! (e-bikes, classic bikes, free docks) and by a maximum walking radius,
//! plus name lookup for a caller's preferred destination station.

use crate::models::{Coordinate, Station};

use super::StationIndex;

/// Search radius applied when the caller does not configure one
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 700.0;

/// Free docks needed for a station to count as having room
pub const DEFAULT_MIN_DOCKS: u32 = 5;

/// What a station must offer to qualify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Ebikes,
    ClassicBikes,
    Docks(u32),
}

impl Capability {
    #[must_use]
    pub fn matches(self, station: &Station) -> bool {
        match self {
            Capability::Ebikes => station.has_ebikes(),
            Capability::ClassicBikes => station.has_classic(),
            Capability::Docks(min_docks) => station.has_docks(min_docks),
        }
    }
}

/// Read-only query view over a [`StationIndex`]
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityResolver<'a> {
    index: &'a StationIndex,
}

impl<'a> AvailabilityResolver<'a> {
    #[must_use]
    pub fn new(index: &'a StationIndex) -> Self {
        Self { index }
    }

    /// Closest located station, regardless of inventory
    #[must_use]
    pub fn nearest_any(&self, point: &Coordinate) -> Option<&'a Station> {
        self.index
            .nearest_matching(point, |_| true)
            .map(|(station, _)| station)
    }

    /// Closest station satisfying `predicate` within `max_radius_m`
    ///
    /// Returns `None` when no station qualifies or the closest qualifying
    /// one lies beyond the radius.
    pub fn nearest_with<P>(
        &self,
        point: &Coordinate,
        predicate: P,
        max_radius_m: f64,
    ) -> Option<(&'a Station, f64)>
    where
        P: Fn(&Station) -> bool,
    {
        self.index
            .nearest_matching(point, predicate)
            .filter(|(_, distance)| *distance <= max_radius_m)
    }

    /// [`Self::nearest_with`] for one of the standard capabilities
    #[must_use]
    pub fn nearest_with_capability(
        &self,
        point: &Coordinate,
        capability: Capability,
        max_radius_m: f64,
    ) -> Option<(&'a Station, f64)> {
        self.nearest_with(point, |station| capability.matches(station), max_radius_m)
    }

    /// Find a station by name, ignoring case
    ///
    /// An exact match wins; otherwise the first station whose name contains
    /// `name` is returned. Blank input never matches.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&'a Station> {
        let target = name.trim().to_lowercase();
        if target.is_empty() {
            return None;
        }

        let named = || {
            self.index
                .iter()
                .filter_map(|station| station.name.as_ref().map(|n| (station, n.to_lowercase())))
        };

        named()
            .find(|(_, n)| n.trim() == target)
            .or_else(|| named().find(|(_, n)| n.contains(&target)))
            .map(|(station, _)| station)
    }
}
