//! Bikeshare station record

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Coordinate;

/// One docking station after merging static information with live status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Station {
    pub station_id: String,
    /// Absent while the static feed has not caught up with the status feed
    pub name: Option<String>,
    pub location: Option<Coordinate>,
    pub ebikes_available: u32,
    /// Total bikes minus e-bikes, clamped at zero
    pub classic_available: u32,
    pub docks_available: u32,
}

impl Station {
    /// Name for user-facing text, falling back to the station id
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.station_id)
    }

    #[must_use]
    pub fn has_ebikes(&self) -> bool {
        self.ebikes_available > 0
    }

    #[must_use]
    pub fn has_classic(&self) -> bool {
        self.classic_available > 0
    }

    #[must_use]
    pub fn has_docks(&self, min_docks: u32) -> bool {
        self.docks_available >= min_docks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: Option<&str>) -> Station {
        Station {
            station_id: "72".to_string(),
            name: name.map(str::to_string),
            location: None,
            ebikes_available: 0,
            classic_available: 2,
            docks_available: 5,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        assert_eq!(station(Some("W 52 St & 11 Ave")).display_name(), "W 52 St & 11 Ave");
        assert_eq!(station(None).display_name(), "72");
    }

    #[test]
    fn test_capabilities() {
        let s = station(None);
        assert!(!s.has_ebikes());
        assert!(s.has_classic());
        assert!(s.has_docks(5));
        assert!(!s.has_docks(6));
    }
}
