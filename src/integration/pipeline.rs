//! OccupancyPipeline: frame source, zone tracking, identity resolution and
//! event sink wired into one sequential loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::{debug, info, warn};

use crate::config::OccupancyConfig;
use crate::error::{ExtractorError, PipelineError};
use crate::identity::{Identification, IdentityRegistry, SharedIdentityRegistry};
use crate::integration::extractor::FeatureExtractor;
use crate::integration::sampling::SamplingPolicy;
use crate::integration::sink::EventSink;
use crate::integration::source::{Frame, FrameSource};
use crate::integration::worker::{ExtractionJob, ExtractionResult, ExtractionWorker};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::tracker::{Detection, OccupancyEvent, OccupancyTracker, TrackerConfig};

enum Extraction<E> {
    Inline(E),
    Offloaded(ExtractionWorker),
}

/// What happened to one received frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Dropped by the sampling policy
    Skipped { index: u64 },
    Processed {
        index: u64,
        events: Vec<OccupancyEvent>,
        inside_count: usize,
    },
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub inside_count: usize,
    pub stopped_early: bool,
    pub metrics: MetricsSnapshot,
}

/// Sequential per-camera pipeline.
///
/// Each frame is fully handled before the next is pulled: detections go
/// through the tracker, events are appended to the sink in order, and tracks
/// that just entered get their identity resolved. With inline extraction the
/// label is attached before the next frame; with an offloaded worker it is
/// attached when the result arrives, unless the track has transitioned since.
pub struct OccupancyPipeline<S: FrameSource, E: FeatureExtractor, K: EventSink> {
    source: S,
    sink: K,
    extraction: Extraction<E>,
    tracker: OccupancyTracker,
    registry: SharedIdentityRegistry,
    sampling: SamplingPolicy,
    metrics: PipelineMetrics,
    received: u64,
}

impl<S: FrameSource, E: FeatureExtractor, K: EventSink> OccupancyPipeline<S, E, K> {
    /// Create a pipeline with an empty registry and no sampling.
    pub fn new(source: S, extractor: E, sink: K, config: TrackerConfig) -> Self {
        Self {
            source,
            sink,
            extraction: Extraction::Inline(extractor),
            tracker: OccupancyTracker::new(config),
            registry: SharedIdentityRegistry::default(),
            sampling: SamplingPolicy::default(),
            metrics: PipelineMetrics::new(),
            received: 0,
        }
    }

    /// Create a pipeline from a run configuration. Offloading is left to the
    /// caller, see [`offload_extraction`](Self::offload_extraction).
    pub fn from_config(source: S, extractor: E, sink: K, config: &OccupancyConfig) -> Self {
        Self::new(source, extractor, sink, config.tracker_config())
            .with_registry(SharedIdentityRegistry::new(IdentityRegistry::new(
                config.registry_config(),
            )))
            .with_sampling(config.sampling())
    }

    pub fn with_registry(mut self, registry: SharedIdentityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Move the extractor onto a background worker thread.
    pub fn offload_extraction(mut self) -> Self
    where
        E: Send + 'static,
    {
        self.extraction = match self.extraction {
            Extraction::Inline(extractor) => Extraction::Offloaded(ExtractionWorker::spawn(extractor)),
            offloaded => offloaded,
        };
        self
    }

    /// Pull and handle one frame. `Ok(None)` at end of stream.
    pub fn step(&mut self) -> Result<Option<FrameOutcome>, PipelineError> {
        let Some(frame) = self.source.next_frame()? else {
            return Ok(None);
        };
        self.received += 1;
        self.metrics.add_frames_seen(1);

        if !self.sampling.should_process(self.received) {
            return Ok(Some(FrameOutcome::Skipped { index: frame.index }));
        }

        self.collect_offloaded(false);

        let dropped_before = self.tracker.dropped_detections();
        let events = self.tracker
            .process_frame_at(frame.index, &frame.detections, Utc::now());
        self.metrics
            .add_detections_dropped(self.tracker.dropped_detections() - dropped_before);
        self.metrics.add_frames_processed(1);

        for event in &events {
            self.sink.append(event)?;
            if event.is_entry() {
                self.metrics.add_entries(1);
            } else {
                self.metrics.add_exits(1);
            }
        }

        self.resolve_identities(&frame, &events);

        Ok(Some(FrameOutcome::Processed {
            index: frame.index,
            events,
            inside_count: self.tracker.inside_count(),
        }))
    }

    /// Run until the source ends or `stop` is raised.
    ///
    /// `stop` is checked between frames, so a frame is never half processed.
    /// The sink is flushed and the source released on every exit path that
    /// leaves the sink usable.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<RunSummary, PipelineError> {
        let mut stopped_early = false;
        loop {
            if stop.load(Ordering::SeqCst) {
                info!("stop requested, finishing run");
                stopped_early = true;
                break;
            }
            match self.step() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(PipelineError::Source(err)) => {
                    warn!("frame source failed: {}", err);
                    self.finish()?;
                    return Err(PipelineError::Source(err));
                }
                Err(err) => {
                    self.source.release();
                    return Err(err);
                }
            }
        }
        self.finish()?;

        Ok(RunSummary {
            inside_count: self.tracker.inside_count(),
            stopped_early,
            metrics: self.metrics.snapshot(),
        })
    }

    fn finish(&mut self) -> Result<(), PipelineError> {
        self.collect_offloaded(true);
        self.source.release();
        self.sink.flush()?;
        Ok(())
    }

    fn resolve_identities(&mut self, frame: &Frame, events: &[OccupancyEvent]) {
        let Some(image) = frame.image.as_ref() else {
            return;
        };

        let latest: HashMap<u64, &Detection> =
            frame.detections.iter().map(|d| (d.track_id, d)).collect();

        for event in events.iter().filter(|e| e.is_entry()) {
            let Some(track) = self.tracker.track(event.track_id) else {
                continue;
            };
            if track.identity.is_some() {
                continue;
            }
            let revision = track.revision;
            let Some(region) = latest.get(&event.track_id).and_then(|d| image.crop(&d.bbox)) else {
                debug!("no usable crop for track {}", event.track_id);
                continue;
            };

            match &mut self.extraction {
                Extraction::Inline(extractor) => {
                    let outcome = extractor.extract(&region);
                    self.apply_extraction(event.track_id, revision, outcome);
                }
                Extraction::Offloaded(worker) => {
                    let job = ExtractionJob {
                        track_id: event.track_id,
                        revision,
                        region,
                    };
                    if let Err(err) = worker.submit(job) {
                        warn!("could not queue extraction for track {}: {}", event.track_id, err);
                        self.metrics.add_extraction_failures(1);
                    }
                }
            }
        }
    }

    fn collect_offloaded(&mut self, wait: bool) {
        let results: Vec<ExtractionResult> = match &mut self.extraction {
            Extraction::Offloaded(worker) if wait => worker.drain(),
            Extraction::Offloaded(worker) => worker.try_results(),
            Extraction::Inline(_) => return,
        };
        for result in results {
            self.apply_extraction(result.track_id, result.revision, result.outcome);
        }
    }

    fn apply_extraction(
        &mut self,
        track_id: u64,
        revision: u64,
        outcome: Result<Option<Vec<f32>>, ExtractorError>,
    ) {
        if !self.tracker.is_current(track_id, revision) {
            debug!("dropping stale extraction for track {}", track_id);
            self.metrics.add_stale_results_dropped(1);
            return;
        }

        let vector = match outcome {
            Ok(Some(vector)) => vector,
            Ok(None) => {
                debug!("no features found for track {}", track_id);
                return;
            }
            Err(err) => {
                warn!("feature extraction failed for track {}: {}", track_id, err);
                self.metrics.add_extraction_failures(1);
                return;
            }
        };

        let registry_was_empty = self.registry.is_empty();
        let label = match self.registry.identify(&vector) {
            Identification::Matched {
                label, confidence, ..
            } => {
                self.metrics.add_identities_matched(1);
                debug!("track {} recognised as {} ({:.2}%)", track_id, label, confidence);
                label.to_string()
            }
            Identification::Unknown {
                registered: Some(label),
            } => {
                self.metrics.add_unknowns_registered(1);
                label.to_string()
            }
            Identification::Unknown { registered: None } => {
                if !registry_was_empty {
                    self.metrics.add_duplicates_suppressed(1);
                }
                return;
            }
        };

        if !self.tracker.attach_identity(track_id, revision, label) {
            self.metrics.add_stale_results_dropped(1);
        }
    }

    /// Label attached to a track, if any.
    pub fn label_for(&self, track_id: u64) -> Option<&str> {
        self.tracker.track(track_id)?.identity.as_deref()
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &OccupancyTracker {
        &self.tracker
    }

    /// Get a handle to the shared registry.
    pub fn registry(&self) -> &SharedIdentityRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Get a reference to the frame source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a reference to the event sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Get a mutable reference to the event sink.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Tear down, returning the source and sink.
    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }
}
