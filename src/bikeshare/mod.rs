//! Bikeshare module
//!
//! - GBFS feed snapshots and the client that fetches them
//! - Per-request station index built by merging the two snapshots
//! - Availability queries over the index

pub mod feed;
pub mod index;
pub mod resolver;

pub use feed::{GbfsClient, StationFeedProvider, StationInformation, StationStatus};
pub use index::StationIndex;
pub use resolver::{AvailabilityResolver, Capability, DEFAULT_MIN_DOCKS, DEFAULT_SEARCH_RADIUS_M};
