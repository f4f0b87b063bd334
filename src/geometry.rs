//! Coordinate types shared by the canvas, overlay and magnifier
//!
//! Two spaces exist: page space (unscaled source pixels, integer) and
//! screen space (after the zoom transform, fractional). Conversions
//! between them go through [`crate::viewer::ViewTransform`] only.

use serde::{Deserialize, Serialize};

/// Point in unscaled page pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in page pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners, `bottom_right` exclusive
    #[must_use]
    pub fn from_corners(top_left: PixelPoint, bottom_right: PixelPoint) -> Self {
        Self {
            x: top_left.x,
            y: top_left.y,
            width: bottom_right.x.saturating_sub(top_left.x),
            height: bottom_right.y.saturating_sub(top_left.y),
        }
    }

    /// Exclusive right edge, saturating at `u32::MAX`
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if the (fractional) page position lies inside the rectangle
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32 && x < self.right() as f32 && y >= self.y as f32 && y < self.bottom() as f32
    }

    /// True if the interiors overlap; rectangles sharing only an edge do not
    #[must_use]
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True if the rectangle lies fully inside a `width` x `height` surface
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Point in screen space (after zoom)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in screen space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edge_is_not_overlap() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(10, 0, 10, 10);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn edges_saturate_near_max() {
        let rect = PixelRect::new(u32::MAX - 5, u32::MAX - 1, 10, 10);
        assert_eq!(rect.right(), u32::MAX);
        assert_eq!(rect.bottom(), u32::MAX);
        assert!(!rect.overlaps(&PixelRect::new(0, 0, 10, 10)));
        assert!(!rect.fits_within(100, 100));
    }

    #[test]
    fn interior_intersection_is_overlap() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(9, 9, 10, 10);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn from_corners_excludes_bottom_right() {
        let rect = PixelRect::from_corners(PixelPoint::new(5, 5), PixelPoint::new(15, 25));
        assert_eq!(rect, PixelRect::new(5, 5, 10, 20));
        assert!(rect.contains(14.9, 24.9));
        assert!(!rect.contains(15.0, 10.0));
    }

    #[test]
    fn screen_rect_contains_is_half_open() {
        let rect = ScreenRect::new(-10.0, 0.0, 20.0, 5.0);
        assert!(rect.contains(ScreenPoint::new(-10.0, 0.0)));
        assert!(!rect.contains(ScreenPoint::new(10.0, 2.0)));
    }
}
