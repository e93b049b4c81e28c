//! Owned table of live tracks.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::tracker::track_state::TrackState;

/// When a track record may be dropped from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Records live for the whole run. A track that vanishes while inside
    /// stays counted until it is seen outside again.
    #[default]
    Never,
    /// Records idle for longer than the duration are evicted, and an Exit is
    /// forced for evicted tracks that were inside.
    IdleTimeout(Duration),
}

/// Exactly one [`TrackState`] per live track id.
#[derive(Debug, Default)]
pub struct TrackTable {
    tracks: HashMap<u64, TrackState>,
    policy: EvictionPolicy,
}

impl TrackTable {
    /// Create an empty table with the given eviction policy.
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            tracks: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Get a track by id.
    pub fn get(&self, track_id: u64) -> Option<&TrackState> {
        self.tracks.get(&track_id)
    }

    /// Get a mutable reference to a track by id.
    pub fn get_mut(&mut self, track_id: u64) -> Option<&mut TrackState> {
        self.tracks.get_mut(&track_id)
    }

    /// Look up a track, creating it with `init` on first sighting.
    pub fn get_or_insert_with<F>(&mut self, track_id: u64, init: F) -> &mut TrackState
    where
        F: FnOnce() -> TrackState,
    {
        self.tracks.entry(track_id).or_insert_with(init)
    }

    /// Number of live tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackState> {
        self.tracks.values()
    }

    /// Full scan of tracks currently inside the zone.
    pub fn count_inside(&self) -> usize {
        self.tracks.values().filter(|t| t.is_inside()).count()
    }

    /// Remove tracks idle past the configured timeout.
    ///
    /// Returned states are sorted by track id so forced exits come out in a
    /// deterministic order. Always empty under [`EvictionPolicy::Never`].
    pub fn evict_idle(&mut self, now: DateTime<Utc>) -> Vec<TrackState> {
        let timeout = match self.policy {
            EvictionPolicy::Never => return Vec::new(),
            EvictionPolicy::IdleTimeout(timeout) => timeout,
        };

        let expired: Vec<u64> = self
            .tracks
            .values()
            .filter(|t| now - t.last_updated_at > timeout)
            .map(|t| t.track_id)
            .collect();

        let mut evicted: Vec<TrackState> = expired
            .into_iter()
            .filter_map(|id| self.tracks.remove(&id))
            .collect();
        evicted.sort_by_key(|t| t.track_id);
        evicted
    }
}
