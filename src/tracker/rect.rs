use nalgebra::Point2;

/// Axis-aligned bounding box in pixel coordinates.
///
/// Stored as top-left corner plus size (TLWH). Detectors usually report
/// corners (TLBR), see [`Rect::from_tlbr`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from its center and dimensions.
    #[inline]
    pub fn from_xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Geometric center of the box.
    #[inline]
    pub fn centroid(&self) -> Point2<f32> {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Center snapped down to whole pixels, `((x1 + x2) // 2, (y1 + y2) // 2)`.
    ///
    /// Zone membership is decided on this point, so a box whose floored
    /// center lands on a zone edge counts as inside.
    #[inline]
    pub fn pixel_centroid(&self) -> Point2<f32> {
        let [x1, y1, x2, y2] = self.to_tlbr();
        Point2::new(((x1 + x2) / 2.0).floor(), ((y1 + y2) / 2.0).floor())
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// A box with non-finite coordinates or non-positive extent.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.width <= 0.0 || self.height <= 0.0
    }

    /// Clip the box to `[0, width) x [0, height)` and snap it to whole pixels.
    ///
    /// Returns `(x, y, w, h)` or `None` when nothing of the box is left.
    pub fn clip_to_pixels(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if self.is_degenerate() {
            return None;
        }
        let [x1, y1, x2, y2] = self.to_tlbr();
        let x1 = x1.floor().clamp(0.0, width as f32) as u32;
        let y1 = y1.floor().clamp(0.0, height as f32) as u32;
        let x2 = x2.ceil().clamp(0.0, width as f32) as u32;
        let y2 = y2.ceil().clamp(0.0, height as f32) as u32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1, y1, x2 - x1, y2 - y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_from_xywh() {
        let rect = Rect::from_xywh(25.0, 40.0, 30.0, 40.0);
        assert!((rect.x - 10.0).abs() < 1e-6);
        assert!((rect.y - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_centroid() {
        let c = Rect::from_tlbr(100.0, 50.0, 200.0, 150.0).centroid();
        assert_eq!(c, Point2::new(150.0, 100.0));
    }

    #[test]
    fn test_pixel_centroid_floors_odd_extents() {
        let rect = Rect::from_tlbr(849.0, 300.0, 852.0, 311.0);
        assert_eq!(rect.centroid(), Point2::new(850.5, 305.5));
        assert_eq!(rect.pixel_centroid(), Point2::new(850.0, 305.0));
    }

    #[test]
    fn test_degenerate() {
        assert!(Rect::from_tlbr(10.0, 10.0, 10.0, 50.0).is_degenerate());
        assert!(Rect::from_tlbr(10.0, 50.0, 40.0, 20.0).is_degenerate());
        assert!(Rect::new(f32::NAN, 0.0, 10.0, 10.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_clip_to_pixels() {
        let rect = Rect::from_tlbr(-5.0, 10.2, 30.0, 500.0);
        assert_eq!(rect.clip_to_pixels(100, 100), Some((0, 10, 30, 90)));

        let outside = Rect::from_tlbr(200.0, 200.0, 220.0, 220.0);
        assert_eq!(outside.clip_to_pixels(100, 100), None);
    }
}
