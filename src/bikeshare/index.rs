//! Per-request station index
//!
//! Built by merging the static information snapshot with the live status
//! snapshot. Queries are linear scans; a few thousand stations per city
//! does not warrant a spatial index.

use std::collections::HashMap;

use crate::geo;
use crate::models::{Coordinate, Station};

use super::feed::{StationInformation, StationInformationRecord, StationStatus};

/// Immutable collection of merged stations for one request
#[derive(Debug, Clone, Default)]
pub struct StationIndex {
    stations: Vec<Station>,
}

impl StationIndex {
    /// Merge the two feed snapshots keyed on `station_id`
    ///
    /// Every status record yields a station, even when the information feed
    /// has no matching entry yet; its name and location are then absent.
    #[must_use]
    pub fn from_feeds(info: &StationInformation, status: &StationStatus) -> Self {
        let info_by_id: HashMap<&str, &StationInformationRecord> = info
            .data
            .stations
            .iter()
            .map(|record| (record.station_id.as_str(), record))
            .collect();

        let stations = status
            .data
            .stations
            .iter()
            .map(|live| {
                let base = info_by_id.get(live.station_id.as_str());
                let ebikes = live.num_ebikes_available.unwrap_or(0);
                let total = live.num_bikes_available.unwrap_or(0);
                Station {
                    station_id: live.station_id.clone(),
                    name: base.and_then(|b| b.name.clone()),
                    location: base.and_then(|b| b.coordinate()),
                    ebikes_available: ebikes,
                    classic_available: total.saturating_sub(ebikes),
                    docks_available: live.num_docks_available.unwrap_or(0),
                }
            })
            .collect();

        Self { stations }
    }

    #[must_use]
    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Closest located station accepted by `predicate`, with its distance
    ///
    /// Exact distance ties go to the lexicographically smaller
    /// `station_id`, so the answer does not depend on feed order.
    pub fn nearest_matching<P>(&self, point: &Coordinate, predicate: P) -> Option<(&Station, f64)>
    where
        P: Fn(&Station) -> bool,
    {
        self.stations
            .iter()
            .filter(|station| predicate(*station))
            .filter_map(|station| {
                station
                    .location
                    .map(|location| (station, geo::distance_m(point, &location)))
            })
            .fold(None, |best: Option<(&Station, f64)>, candidate| match best {
                Some(current) if !is_closer(candidate, current) => Some(current),
                _ => Some(candidate),
            })
    }
}

fn is_closer(candidate: (&Station, f64), current: (&Station, f64)) -> bool {
    candidate.1 < current.1
        || (candidate.1 == current.1 && candidate.0.station_id < current.0.station_id)
}
