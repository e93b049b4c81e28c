//! Error types.
//!
//! Geometry, tracking and registry logic never fail; they return sentinel
//! results instead. Only the I/O-facing collaborators below can error.

use std::path::PathBuf;

use thiserror::Error;

/// Errors while loading known identities.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse seed file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("seed entry {label:?} has an empty feature vector")]
    EmptyVector { label: String },
    #[error("seed entry {label:?} has a non-finite feature value")]
    NonFinite { label: String },
    #[error("seed entry {label:?} has {got} features, expected {expected}")]
    DimensionMismatch {
        label: String,
        expected: usize,
        got: usize,
    },
}

/// Errors from a frame source. Fatal for the stream.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("frame source unavailable: {0}")]
    Unavailable(String),
    #[error("frame source I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame record on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("frame index {got} does not follow {previous}")]
    OutOfOrder { previous: u64, got: u64 },
}

/// Errors from a feature extractor. Skipped per occurrence.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("image region is {got} bytes, expected {expected}")]
    InvalidRegion { expected: usize, got: usize },
    #[error("feature extraction failed: {0}")]
    Failed(String),
    #[error("extraction worker is gone")]
    Disconnected,
}

/// Errors from an event sink. Fatal: events must not be lost silently.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("event sink CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("event sink encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that stop a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
