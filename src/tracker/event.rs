use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a zone-boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Entry,
    Exit,
}

/// An edge-triggered zone transition for one track. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEvent {
    pub track_id: u64,
    pub kind: EventKind,
    /// Frame in which the transition was observed
    pub frame_index: u64,
    pub timestamp: DateTime<Utc>,
}

impl OccupancyEvent {
    pub fn entry(track_id: u64, frame_index: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            track_id,
            kind: EventKind::Entry,
            frame_index,
            timestamp,
        }
    }

    pub fn exit(track_id: u64, frame_index: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            track_id,
            kind: EventKind::Exit,
            frame_index,
            timestamp,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.kind == EventKind::Entry
    }
}
