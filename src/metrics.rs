//! Pipeline counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters updated by the pipeline. Cloning shares the counters.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    frames_seen: AtomicU64,
    frames_processed: AtomicU64,
    detections_dropped: AtomicU64,
    entries: AtomicU64,
    exits: AtomicU64,
    identities_matched: AtomicU64,
    unknowns_registered: AtomicU64,
    duplicates_suppressed: AtomicU64,
    stale_results_dropped: AtomicU64,
    extraction_failures: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_seen: u64,
    pub frames_processed: u64,
    pub detections_dropped: u64,
    pub entries: u64,
    pub exits: u64,
    pub identities_matched: u64,
    pub unknowns_registered: u64,
    pub duplicates_suppressed: u64,
    pub stale_results_dropped: u64,
    pub extraction_failures: u64,
}

macro_rules! counter {
    ($inc:ident, $field:ident) => {
        pub fn $inc(&self, n: u64) {
            self.inner.$field.fetch_add(n, Ordering::Relaxed);
        }
    };
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(add_frames_seen, frames_seen);
    counter!(add_frames_processed, frames_processed);
    counter!(add_detections_dropped, detections_dropped);
    counter!(add_entries, entries);
    counter!(add_exits, exits);
    counter!(add_identities_matched, identities_matched);
    counter!(add_unknowns_registered, unknowns_registered);
    counter!(add_duplicates_suppressed, duplicates_suppressed);
    counter!(add_stale_results_dropped, stale_results_dropped);
    counter!(add_extraction_failures, extraction_failures);

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            frames_seen: c.frames_seen.load(Ordering::Relaxed),
            frames_processed: c.frames_processed.load(Ordering::Relaxed),
            detections_dropped: c.detections_dropped.load(Ordering::Relaxed),
            entries: c.entries.load(Ordering::Relaxed),
            exits: c.exits.load(Ordering::Relaxed),
            identities_matched: c.identities_matched.load(Ordering::Relaxed),
            unknowns_registered: c.unknowns_registered.load(Ordering::Relaxed),
            duplicates_suppressed: c.duplicates_suppressed.load(Ordering::Relaxed),
            stale_results_dropped: c.stale_results_dropped.load(Ordering::Relaxed),
            extraction_failures: c.extraction_failures.load(Ordering::Relaxed),
        }
    }
}
