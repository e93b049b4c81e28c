//! Per-track record kept between frames.

use chrono::{DateTime, Utc};
use nalgebra::Point2;

/// Zone membership of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneMembership {
    /// Outside the zone. Every track starts here, so a first sighting
    /// inside the zone still produces an Entry.
    #[default]
    Outside,
    /// Inside the zone, counted in the occupancy total
    Inside,
}

impl ZoneMembership {
    #[inline]
    pub fn from_inside(inside: bool) -> Self {
        if inside { Self::Inside } else { Self::Outside }
    }

    #[inline]
    pub fn is_inside(self) -> bool {
        self == Self::Inside
    }
}

/// Mutable record for one live track id.
#[derive(Debug, Clone)]
pub struct TrackState {
    /// Identifier assigned by the upstream tracker
    pub track_id: u64,
    /// Centroid of the most recent detection
    pub last_centroid: Point2<f32>,
    /// Membership as of the most recent detection
    pub membership: ZoneMembership,
    pub first_seen_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Frame of the most recent detection
    pub last_frame: u64,
    /// Bumped on every membership transition
    pub revision: u64,
    /// Identity label attached after an Entry, if any
    pub identity: Option<String>,
}

impl TrackState {
    /// Create the record for a first sighting. No event is implied.
    pub fn new(track_id: u64, centroid: Point2<f32>, frame: u64, at: DateTime<Utc>) -> Self {
        Self {
            track_id,
            last_centroid: centroid,
            membership: ZoneMembership::Outside,
            first_seen_at: at,
            last_updated_at: at,
            last_frame: frame,
            revision: 0,
            identity: None,
        }
    }

    #[inline]
    pub fn is_inside(&self) -> bool {
        self.membership.is_inside()
    }

    /// Refresh position and timestamps without touching membership.
    pub fn touch(&mut self, centroid: Point2<f32>, frame: u64, at: DateTime<Utc>) {
        self.last_centroid = centroid;
        self.last_frame = frame;
        self.last_updated_at = at;
    }

    /// Record a membership transition and bump the revision.
    pub fn transition(&mut self, membership: ZoneMembership) {
        debug_assert_ne!(self.membership, membership);
        self.membership = membership;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_track_starts_outside() {
        let state = TrackState::new(3, Point2::new(1.0, 2.0), 1, Utc::now());
        assert_eq!(state.membership, ZoneMembership::Outside);
        assert_eq!(state.revision, 0);
        assert!(state.identity.is_none());
    }

    #[test]
    fn test_transition_bumps_revision_and_keeps_label() {
        let mut state = TrackState::new(3, Point2::new(1.0, 2.0), 1, Utc::now());
        state.transition(ZoneMembership::Inside);
        state.identity = Some("alice".into());
        assert_eq!(state.revision, 1);

        state.transition(ZoneMembership::Outside);
        assert_eq!(state.revision, 2);
        assert_eq!(state.identity.as_deref(), Some("alice"));
    }
}
