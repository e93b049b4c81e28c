//! Background feature extraction.
//!
//! Encoding a face is the one slow step of a frame. The worker runs an
//! extractor on its own thread so the capture loop can keep going; results
//! carry the track revision they were requested for, and the pipeline drops
//! those that no longer match the track.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use log::warn;

use crate::error::ExtractorError;
use crate::integration::extractor::{FeatureExtractor, ImageRegion};

/// A crop waiting to be encoded.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub track_id: u64,
    pub revision: u64,
    pub region: ImageRegion,
}

/// Encoder output for one job.
#[derive(Debug)]
pub struct ExtractionResult {
    pub track_id: u64,
    pub revision: u64,
    pub outcome: Result<Option<Vec<f32>>, ExtractorError>,
}

/// Runs a [`FeatureExtractor`] on a dedicated thread.
pub struct ExtractionWorker {
    jobs: Option<Sender<ExtractionJob>>,
    results: Receiver<ExtractionResult>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl ExtractionWorker {
    pub fn spawn<E>(mut extractor: E) -> Self
    where
        E: FeatureExtractor + Send + 'static,
    {
        let (job_tx, job_rx) = unbounded::<ExtractionJob>();
        let (result_tx, result_rx) = unbounded();

        let handle = thread::spawn(move || {
            for job in job_rx {
                let outcome = extractor.extract(&job.region);
                let result = ExtractionResult {
                    track_id: job.track_id,
                    revision: job.revision,
                    outcome,
                };
                if result_tx.send(result).is_err() {
                    break;
                }
            }
        });

        Self {
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
            in_flight: 0,
        }
    }

    pub fn submit(&mut self, job: ExtractionJob) -> Result<(), ExtractorError> {
        let jobs = self.jobs.as_ref().ok_or(ExtractorError::Disconnected)?;
        jobs.send(job).map_err(|_| ExtractorError::Disconnected)?;
        self.in_flight += 1;
        Ok(())
    }

    /// Jobs submitted but not yet collected.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collect finished results without blocking.
    pub fn try_results(&mut self) -> Vec<ExtractionResult> {
        let mut done = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(result) => {
                    self.in_flight -= 1;
                    done.push(result);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.in_flight > 0 {
                        warn!("extraction worker stopped with {} jobs pending", self.in_flight);
                        self.in_flight = 0;
                    }
                    break;
                }
            }
        }
        done
    }

    /// Block until every submitted job has produced a result.
    pub fn drain(&mut self) -> Vec<ExtractionResult> {
        let mut done = Vec::with_capacity(self.in_flight);
        while self.in_flight > 0 {
            match self.results.recv() {
                Ok(result) => {
                    self.in_flight -= 1;
                    done.push(result);
                }
                Err(_) => {
                    warn!("extraction worker stopped with {} jobs pending", self.in_flight);
                    self.in_flight = 0;
                }
            }
        }
        done
    }
}

impl Drop for ExtractionWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("extraction worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(width: u32) -> ImageRegion {
        ImageRegion::new(width, 1, 1, vec![0; width as usize]).unwrap()
    }

    #[test]
    fn test_worker_round_trips_jobs_in_order() {
        let mut worker = ExtractionWorker::spawn(
            |r: &ImageRegion| -> Result<Option<Vec<f32>>, ExtractorError> {
                Ok(Some(vec![r.width as f32]))
            },
        );
        for (i, w) in [3u32, 5, 7].into_iter().enumerate() {
            worker
                .submit(ExtractionJob {
                    track_id: i as u64,
                    revision: 1,
                    region: region(w),
                })
                .unwrap();
        }
        assert_eq!(worker.in_flight(), 3);

        let results = worker.drain();
        assert_eq!(worker.in_flight(), 0);
        let widths: Vec<f32> = results
            .iter()
            .map(|r| r.outcome.as_ref().unwrap().as_ref().unwrap()[0])
            .collect();
        assert_eq!(widths, vec![3.0, 5.0, 7.0]);
        assert!(worker.try_results().is_empty());
    }

    #[test]
    fn test_worker_passes_failures_through() {
        let mut worker = ExtractionWorker::spawn(
            |_: &ImageRegion| -> Result<Option<Vec<f32>>, ExtractorError> {
                Err(ExtractorError::Failed("no model".into()))
            },
        );
        worker
            .submit(ExtractionJob {
                track_id: 1,
                revision: 1,
                region: region(1),
            })
            .unwrap();
        let results = worker.drain();
        assert!(matches!(results[0].outcome, Err(ExtractorError::Failed(_))));
    }
}
