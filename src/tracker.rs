mod detection;
mod event;
mod occupancy_tracker;
mod rect;
mod track_state;
mod track_table;
mod zone;

pub use detection::Detection;
pub use event::{EventKind, OccupancyEvent};
pub use occupancy_tracker::{OccupancyTracker, TrackerConfig};
pub use rect::Rect;
pub use track_state::{TrackState, ZoneMembership};
pub use track_table::{EvictionPolicy, TrackTable};
pub use zone::{Zone, is_inside};
