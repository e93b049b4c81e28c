//! Frame sources: where tracked detections come from.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use serde::Deserialize;

use crate::error::SourceError;
use crate::integration::builder::DetectionBuilder;
use crate::integration::extractor::ImageRegion;
use crate::tracker::{Detection, Rect};

/// Raw frame pixels, row-major and interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Vec<u8>,
}

impl FrameImage {
    /// Copy the pixels under `bbox`, clipped to the frame.
    ///
    /// Returns `None` if the clipped region is empty or the buffer is too
    /// short for the declared dimensions.
    pub fn crop(&self, bbox: &Rect) -> Option<ImageRegion> {
        let (x, y, w, h) = bbox.clip_to_pixels(self.width, self.height)?;
        let channels = self.channels as usize;
        let stride = self.width as usize * channels;
        if self.data.len() < stride * self.height as usize {
            return None;
        }

        let row_len = w as usize * channels;
        let mut data = Vec::with_capacity(row_len * h as usize);
        for row in y..y + h {
            let start = row as usize * stride + x as usize * channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        ImageRegion::new(w, h, self.channels, data).ok()
    }
}

/// One frame's worth of tracked detections.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Strictly increasing across a stream
    pub index: u64,
    pub detections: Vec<Detection>,
    /// Pixels for cropping faces; absent when replaying recorded detections
    pub image: Option<FrameImage>,
}

impl Frame {
    pub fn new(index: u64, detections: Vec<Detection>) -> Self {
        let detections = detections.into_iter().map(|d| d.at_frame(index)).collect();
        Self {
            index,
            detections,
            image: None,
        }
    }

    pub fn with_image(mut self, image: FrameImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Trait for anything that supplies frames of tracked detections.
///
/// Implement this trait to connect a camera + detector/tracker stack to the
/// occupancy pipeline.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` at end of stream.
    ///
    /// An error means the stream cannot continue.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Release the underlying capture resource. Called once when a run ends.
    fn release(&mut self) {}
}

/// In-memory source, mostly for tests and replays.
#[derive(Debug, Default)]
pub struct VecSource {
    frames: VecDeque<Frame>,
    released: bool,
}

impl VecSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for VecSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    frame: u64,
    #[serde(default)]
    detections: Vec<DetectionRecord>,
}

#[derive(Debug, Deserialize)]
struct DetectionRecord {
    track_id: u64,
    #[serde(default)]
    class_id: u32,
    #[serde(rename = "box")]
    bbox: [f32; 4],
}

/// Recorded tracker output, one JSON object per line:
///
/// ```text
/// {"frame": 3, "detections": [{"track_id": 7, "class_id": 0, "box": [10, 20, 50, 80]}]}
/// ```
///
/// Boxes are `[x1, y1, x2, y2]`. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    previous: Option<u64>,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                SourceError::Unavailable(format!("{}: {}", path.display(), e))
            }
            _ => SourceError::Io(e),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            previous: None,
        }
    }
}

impl<R: BufRead> FrameSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if !buf.trim().is_empty() {
                break;
            }
        }

        let record: FrameRecord = serde_json::from_str(buf.trim()).map_err(|source| {
            SourceError::Parse {
                line: self.line,
                source,
            }
        })?;

        if let Some(previous) = self.previous {
            if record.frame <= previous {
                return Err(SourceError::OutOfOrder {
                    previous,
                    got: record.frame,
                });
            }
        }
        self.previous = Some(record.frame);

        let detections = record
            .detections
            .into_iter()
            .map(|d| {
                let [x1, y1, x2, y2] = d.bbox;
                DetectionBuilder::new()
                    .track_id(d.track_id)
                    .class_id(d.class_id)
                    .tlbr(x1, y1, x2, y2)
                    .build()
            })
            .collect();
        Ok(Some(Frame::new(record.frame, detections)))
    }
}
