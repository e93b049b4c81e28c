//! Integration module connecting frame sources, face encoders and event
//! sinks with the occupancy tracker.
//!
//! This module provides the traits at each seam of the pipeline and a few
//! ready-made implementations (JSON-lines replay, CSV ledger, background
//! extraction worker).

mod builder;
mod extractor;
mod pipeline;
mod sampling;
mod sink;
mod source;
mod worker;

pub use builder::DetectionBuilder;
pub use extractor::{FeatureExtractor, ImageRegion, NoopExtractor};
pub use pipeline::{FrameOutcome, OccupancyPipeline, RunSummary};
pub use sampling::SamplingPolicy;
pub use sink::{
    CsvLedgerSink, EventSink, JsonEventLog, LedgerRow, MemorySink, OccupancyLedger,
    TIMESTAMP_FORMAT,
};
pub use source::{Frame, FrameImage, FrameSource, JsonLinesSource, VecSource};
pub use worker::{ExtractionJob, ExtractionResult, ExtractionWorker};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnEncoder, BurnEmbeddingModel};
