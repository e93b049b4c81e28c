//! Zone-membership state machine over tracked detections.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::tracker::detection::Detection;
use crate::tracker::event::OccupancyEvent;
use crate::tracker::track_state::{TrackState, ZoneMembership};
use crate::tracker::track_table::{EvictionPolicy, TrackTable};
use crate::tracker::zone::{Zone, is_inside};

/// Configuration for the OccupancyTracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub zone: Zone,
    pub eviction: EvictionPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            zone: Zone::from_frame(1020, 600, 6),
            eviction: EvictionPolicy::Never,
        }
    }
}

/// Turns per-frame detection batches into Entry/Exit events and keeps a
/// running count of tracks inside the zone.
///
/// Transitions are edge-triggered: an event fires only when a track's
/// membership flips, so Entry and Exit strictly alternate per track,
/// starting with Entry.
pub struct OccupancyTracker {
    zone: Zone,
    tracks: TrackTable,
    inside_count: usize,
    frame_id: u64,
    last_frame_index: u64,
    dropped_detections: u64,
}

impl OccupancyTracker {
    /// Create a tracker with an empty track table.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            zone: config.zone,
            tracks: TrackTable::new(config.eviction),
            inside_count: 0,
            frame_id: 0,
            last_frame_index: 0,
            dropped_detections: 0,
        }
    }

    /// Process one frame, stamping events with the current wall-clock time.
    ///
    /// The frame index is taken from the detections, or one past the last
    /// processed frame when they carry none.
    pub fn process_frame(&mut self, detections: &[Detection]) -> Vec<OccupancyEvent> {
        let frame_index = detections
            .iter()
            .map(|d| d.frame_index)
            .max()
            .unwrap_or(0)
            .max(self.last_frame_index + 1);
        self.process_frame_at(frame_index, detections, Utc::now())
    }

    /// Process frame `frame_index`, observed at `now`.
    ///
    /// Events are returned in the order the detections were supplied, after
    /// any forced exits for evicted tracks. Tracks absent from `detections`
    /// are left untouched unless the eviction policy expires them.
    pub fn process_frame_at(
        &mut self,
        frame_index: u64,
        detections: &[Detection],
        now: DateTime<Utc>,
    ) -> Vec<OccupancyEvent> {
        self.frame_id += 1;
        self.last_frame_index = frame_index;

        let mut events = self.evict_idle(frame_index, now);

        for det in detections {
            if det.is_malformed() {
                self.dropped_detections += 1;
                debug!(
                    "dropping malformed detection for track {} in frame {}",
                    det.track_id, frame_index
                );
                continue;
            }

            let centroid = det.centroid();
            let now_inside = is_inside(&centroid, &self.zone);

            let track = self.tracks.get_or_insert_with(det.track_id, || {
                TrackState::new(det.track_id, centroid, frame_index, now)
            });
            track.touch(centroid, frame_index, now);

            match (track.is_inside(), now_inside) {
                (false, true) => {
                    track.transition(ZoneMembership::Inside);
                    self.inside_count += 1;
                    info!("track {} entered the zone", det.track_id);
                    events.push(OccupancyEvent::entry(det.track_id, frame_index, now));
                }
                (true, false) => {
                    track.transition(ZoneMembership::Outside);
                    self.inside_count -= 1;
                    info!("track {} left the zone", det.track_id);
                    events.push(OccupancyEvent::exit(det.track_id, frame_index, now));
                }
                _ => {}
            }
        }

        events
    }

    fn evict_idle(&mut self, frame_index: u64, now: DateTime<Utc>) -> Vec<OccupancyEvent> {
        let mut events = Vec::new();
        for track in self.tracks.evict_idle(now) {
            debug!("evicting idle track {}", track.track_id);
            if track.is_inside() {
                self.inside_count -= 1;
                info!("track {} timed out inside the zone", track.track_id);
                events.push(OccupancyEvent::exit(track.track_id, frame_index, now));
            }
        }
        events
    }

    /// Whether a result requested at `revision` still applies: the track
    /// exists, is inside, and has not transitioned since.
    pub fn is_current(&self, track_id: u64, revision: u64) -> bool {
        self.tracks
            .get(track_id)
            .is_some_and(|t| t.revision == revision && t.is_inside())
    }

    /// Attach an identity label resolved for the stay that began at
    /// `revision`.
    ///
    /// Results for tracks that were evicted, left the zone, or transitioned
    /// again since the job was issued are stale and dropped (returns `false`).
    pub fn attach_identity(&mut self, track_id: u64, revision: u64, label: String) -> bool {
        if !self.is_current(track_id, revision) {
            debug!("dropping stale identity for track {} (revision {})", track_id, revision);
            return false;
        }
        match self.tracks.get_mut(track_id) {
            Some(track) => {
                track.identity = Some(label);
                true
            }
            None => false,
        }
    }

    /// Incrementally maintained number of tracks inside the zone.
    pub fn inside_count(&self) -> usize {
        self.inside_count
    }

    /// Recompute the inside count by a full scan of the track table.
    pub fn recount_inside(&self) -> usize {
        self.tracks.count_inside()
    }

    /// Get the state of a live track.
    pub fn track(&self, track_id: u64) -> Option<&TrackState> {
        self.tracks.get(track_id)
    }

    /// Get a reference to the track table.
    pub fn tracks(&self) -> &TrackTable {
        &self.tracks
    }

    /// The monitored zone.
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Number of `process_frame` calls so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn dropped_detections(&self) -> u64 {
        self.dropped_detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::event::EventKind;
    use chrono::Duration;

    fn tracker() -> OccupancyTracker {
        OccupancyTracker::new(TrackerConfig {
            zone: Zone::new((100.0, 100.0), (200.0, 200.0)),
            eviction: EvictionPolicy::Never,
        })
    }

    fn det_at(track_id: u64, cx: f32, cy: f32, frame: u64) -> Detection {
        Detection::new(track_id, 0, cx - 10.0, cy - 10.0, cx + 10.0, cy + 10.0).at_frame(frame)
    }

    #[test]
    fn test_first_sighting_inside_emits_entry() {
        let mut tracker = tracker();
        let events = tracker.process_frame(&[det_at(1, 150.0, 150.0, 1)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Entry);
        assert_eq!(tracker.inside_count(), 1);
    }

    #[test]
    fn test_first_sighting_outside_is_silent() {
        let mut tracker = tracker();
        let events = tracker.process_frame(&[det_at(1, 10.0, 10.0, 1)]);
        assert!(events.is_empty());
        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.inside_count(), 0);
    }

    #[test]
    fn test_repeated_inside_is_level_not_edge() {
        let mut tracker = tracker();
        tracker.process_frame(&[det_at(1, 150.0, 150.0, 1)]);
        for frame in 2..10 {
            assert!(tracker.process_frame(&[det_at(1, 150.0, 160.0, frame)]).is_empty());
        }
        assert_eq!(tracker.inside_count(), 1);
    }

    #[test]
    fn test_centroid_on_boundary_counts_as_inside() {
        let mut tracker = tracker();
        let events = tracker.process_frame(&[det_at(4, 100.0, 200.0, 1)]);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_entry());
    }

    #[test]
    fn test_floored_centroid_on_default_zone_edge_enters() {
        let mut tracker = OccupancyTracker::new(TrackerConfig::default());
        // midpoint x is 850.5, floored to 850 = right edge of the zone
        let events = tracker.process_frame(&[Detection::new(1, 0, 849.0, 300.0, 852.0, 310.0)]);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_entry());
        assert_eq!(tracker.inside_count(), 1);
        assert_eq!(tracker.track(1).unwrap().last_centroid.x, 850.0);
    }

    #[test]
    fn test_process_frame_numbers_unindexed_frames() {
        let mut tracker = tracker();
        tracker.process_frame(&[Detection::new(1, 0, 140.0, 140.0, 160.0, 160.0)]);
        tracker.process_frame(&[]);
        let events = tracker.process_frame(&[Detection::new(1, 0, 0.0, 0.0, 20.0, 20.0)]);
        assert_eq!(events[0].frame_index, 3);
        assert_eq!(tracker.frame_id(), 3);
    }

    #[test]
    fn test_malformed_detection_is_dropped() {
        let mut tracker = tracker();
        let bad = Detection::new(9, 0, 150.0, 150.0, 150.0, 170.0);
        let events = tracker.process_frame(&[bad]);
        assert!(events.is_empty());
        assert!(tracker.track(9).is_none());
        assert_eq!(tracker.dropped_detections(), 1);
    }

    #[test]
    fn test_events_follow_detection_order() {
        let mut tracker = tracker();
        let events = tracker.process_frame(&[
            det_at(5, 150.0, 150.0, 1),
            det_at(2, 120.0, 120.0, 1),
            det_at(8, 10.0, 10.0, 1),
        ]);
        let ids: Vec<u64> = events.iter().map(|e| e.track_id).collect();
        assert_eq!(ids, vec![5, 2]);
    }

    #[test]
    fn test_attach_identity_respects_revision() {
        let mut tracker = tracker();
        tracker.process_frame(&[det_at(1, 150.0, 150.0, 1)]);
        let revision = tracker.track(1).unwrap().revision;

        tracker.process_frame(&[det_at(1, 10.0, 10.0, 2)]);
        assert!(!tracker.is_current(1, revision));
        assert!(!tracker.attach_identity(1, revision, "alice".into()));
        assert!(tracker.track(1).unwrap().identity.is_none());

        tracker.process_frame(&[det_at(1, 150.0, 150.0, 3)]);
        let revision = tracker.track(1).unwrap().revision;
        assert!(tracker.attach_identity(1, revision, "alice".into()));
        assert_eq!(tracker.track(1).unwrap().identity.as_deref(), Some("alice"));
        assert!(!tracker.attach_identity(42, 0, "bob".into()));
    }

    #[test]
    fn test_idle_timeout_forces_exit() {
        let start = Utc::now();
        let mut tracker = OccupancyTracker::new(TrackerConfig {
            zone: Zone::new((100.0, 100.0), (200.0, 200.0)),
            eviction: EvictionPolicy::IdleTimeout(Duration::seconds(2)),
        });
        tracker.process_frame_at(1, &[det_at(1, 150.0, 150.0, 1)], start);

        let events = tracker.process_frame_at(2, &[], start + Duration::seconds(3));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Exit);
        assert_eq!(events[0].frame_index, 2);
        assert_eq!(events[0].track_id, 1);
        assert_eq!(tracker.inside_count(), 0);
        assert!(tracker.track(1).is_none());

        let events =
            tracker.process_frame_at(3, &[det_at(1, 150.0, 150.0, 3)], start + Duration::seconds(4));
        assert_eq!(events.len(), 1);
        assert!(events[0].is_entry());
    }
}
