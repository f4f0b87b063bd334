//! Page <-> screen mapping
//!
//! Every consumer that needs to line something up with the painted page
//! (canvas, region overlay, magnifier) reads the same [`ViewTransform`].
//! Screen coordinates here are relative to the top-left corner of the
//! displayed page.

use crate::geometry::{PixelRect, ScreenPoint, ScreenRect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
    width: u32,
    height: u32,
}

impl ViewTransform {
    #[must_use]
    pub fn new(zoom: f32, width: u32, height: u32) -> Self {
        Self {
            zoom,
            width,
            height,
        }
    }

    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Unscaled surface size in page pixels
    #[must_use]
    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the displayed page in screen pixels
    #[must_use]
    pub fn display_size(&self) -> (f32, f32) {
        (self.width as f32 * self.zoom, self.height as f32 * self.zoom)
    }

    /// The displayed page as a screen rectangle anchored at the origin
    #[must_use]
    pub fn display_bounds(&self) -> ScreenRect {
        let (width, height) = self.display_size();
        ScreenRect::new(0.0, 0.0, width, height)
    }

    #[must_use]
    pub fn page_to_screen(&self, x: f32, y: f32) -> ScreenPoint {
        ScreenPoint::new(x * self.zoom, y * self.zoom)
    }

    /// Page position under a screen point, `None` when it misses the page
    #[must_use]
    pub fn screen_to_page(&self, point: ScreenPoint) -> Option<(f32, f32)> {
        if self.zoom <= 0.0 || !self.display_bounds().contains(point) {
            return None;
        }
        Some((point.x / self.zoom, point.y / self.zoom))
    }

    #[must_use]
    pub fn rect_to_screen(&self, rect: PixelRect) -> ScreenRect {
        ScreenRect::new(
            rect.x as f32 * self.zoom,
            rect.y as f32 * self.zoom,
            rect.width as f32 * self.zoom,
            rect.height as f32 * self.zoom,
        )
    }
}
