//! Per-frame tracked detection, as produced by the external tracker.

use nalgebra::Point2;

use crate::tracker::rect::Rect;

/// One tracked detection within a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Persistent identifier assigned by the upstream tracker
    pub track_id: u64,
    /// Detector class label
    pub class_id: u32,
    /// Bounding box in pixel coordinates
    pub bbox: Rect,
    /// Index of the frame this detection belongs to
    pub frame_index: u64,
}

impl Detection {
    pub fn new(track_id: u64, class_id: u32, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            track_id,
            class_id,
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            frame_index: 0,
        }
    }

    pub fn from_rect(track_id: u64, class_id: u32, bbox: Rect) -> Self {
        Self {
            track_id,
            class_id,
            bbox,
            frame_index: 0,
        }
    }

    pub fn at_frame(mut self, frame_index: u64) -> Self {
        self.frame_index = frame_index;
        self
    }

    /// Representative point for the zone test, in whole pixels.
    pub fn centroid(&self) -> Point2<f32> {
        self.bbox.pixel_centroid()
    }

    /// Malformed detections are dropped before they reach track state.
    pub fn is_malformed(&self) -> bool {
        self.bbox.is_degenerate()
    }
}
