//! Room occupancy from tracked detections.
//!
//! Turns per-frame tracked detections into edge-triggered Entry/Exit events
//! for a rectangular zone, keeps a live inside count, and resolves who
//! entered against a registry of face feature vectors that deduplicates
//! unknown visitors.
//!
//! # Example
//!
//! ```
//! use occupancy_rs::{Detection, EventKind, OccupancyTracker, TrackerConfig};
//!
//! let mut tracker = OccupancyTracker::new(TrackerConfig::default());
//! let events = tracker.process_frame(&[Detection::new(7, 0, 400.0, 200.0, 500.0, 300.0)]);
//! assert_eq!(events[0].kind, EventKind::Entry);
//! assert_eq!(tracker.inside_count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod integration;
pub mod metrics;
pub mod tracker;

pub use config::OccupancyConfig;
pub use error::{ConfigError, ExtractorError, PipelineError, SeedError, SinkError, SourceError};
pub use identity::{Identification, IdentityLabel, IdentityRegistry, SharedIdentityRegistry};
pub use integration::{
    EventSink, FeatureExtractor, Frame, FrameSource, ImageRegion, OccupancyPipeline,
    SamplingPolicy,
};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use tracker::{Detection, EventKind, OccupancyEvent, OccupancyTracker, TrackerConfig, Zone};
