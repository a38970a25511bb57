//! Commute recommendation: bike type selection, origin fallback and the
//! request-scoped orchestration around them.

use crate::Result;
use crate::models::{Coordinate, Departure, Preferences};

pub mod engine;
pub mod fallback;
pub mod selector;
pub mod service;

pub use engine::{Conditions, DecisionEngine};
pub use fallback::{OriginResolution, resolve_origin};
pub use selector::BikeTypeSelector;
pub use service::{Collaborators, RecommendationService};

/// One commute to decide on
#[derive(Debug, Clone, PartialEq)]
pub struct TripRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Departure time; `None` means the next forecast hour
    pub depart_at: Option<Departure>,
    pub prefs: Preferences,
}

impl TripRequest {
    #[must_use]
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            depart_at: None,
            prefs: Preferences::default(),
        }
    }

    #[must_use]
    pub fn depart_at(mut self, depart_at: Option<Departure>) -> Self {
        self.depart_at = depart_at;
        self
    }

    #[must_use]
    pub fn with_prefs(mut self, prefs: Preferences) -> Self {
        self.prefs = prefs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.origin.validate()?;
        self.destination.validate()?;
        self.prefs.validate()
    }
}
