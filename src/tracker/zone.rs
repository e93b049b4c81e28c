//! The monitored region and its membership test.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned monitored rectangle, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub top_left: (f32, f32),
    pub bottom_right: (f32, f32),
}

impl Zone {
    pub fn new(top_left: (f32, f32), bottom_right: (f32, f32)) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Derive the zone from frame dimensions, leaving `1/margin_divisor` of
    /// each dimension free on every side.
    ///
    /// Corners are computed with integer division, so a 1020x600 frame with
    /// divisor 6 yields `(170, 100)`-`(850, 500)`.
    pub fn from_frame(width: u32, height: u32, margin_divisor: u32) -> Self {
        let d = margin_divisor.max(1);
        let far = d.saturating_sub(1);
        Self {
            top_left: ((width / d) as f32, (height / d) as f32),
            bottom_right: ((far * width / d) as f32, (far * height / d) as f32),
        }
    }

    /// Closed-rectangle test: points on the boundary count as inside.
    #[inline]
    pub fn contains(&self, point: &Point2<f32>) -> bool {
        is_inside(point, self)
    }
}

/// Zone membership policy.
///
/// `true` iff `top_left.x <= x <= bottom_right.x` and
/// `top_left.y <= y <= bottom_right.y`.
#[inline]
pub fn is_inside(point: &Point2<f32>, zone: &Zone) -> bool {
    zone.top_left.0 <= point.x
        && point.x <= zone.bottom_right.0
        && zone.top_left.1 <= point.y
        && point.y <= zone.bottom_right.1
}
