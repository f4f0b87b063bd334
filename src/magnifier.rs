//! Magnifying loupe
//!
//! [`MagnifierState`] tracks whether the loupe is enabled and whether the
//! pointer is over the page. While tracking, every pointer move yields a
//! [`LoupeView`]: the source region to magnify plus where to place the
//! loupe. [`render_loupe`] turns a view into pixels on the loupe surface.

use image::Rgba;

use crate::geometry::{PixelRect, ScreenPoint};
use crate::surface::Surface;
use crate::viewer::ViewTransform;

/// Side of the square source region, in page pixels
pub const LOUPE_SOURCE_SIZE: u32 = 50;
/// Side of the loupe surface, in screen pixels
pub const LOUPE_SIZE: u32 = 200;
/// Destination pixels per source pixel
pub const LOUPE_SCALE: u32 = LOUPE_SIZE / LOUPE_SOURCE_SIZE;
/// Gap between pointer and loupe edge
pub const LOUPE_GAP: f32 = 20.0;

const BACKDROP: [u8; 4] = [24, 24, 24, 255];
const GRID_COLOR: Rgba<u8> = Rgba([0, 0, 0, 48]);
const CROSSHAIR_COLOR: Rgba<u8> = Rgba([255, 48, 48, 170]);
const CROSSHAIR_WIDTH: u32 = 2;

/// One pointer observation, in viewport coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    /// Pointer position in the viewport
    pub pointer: ScreenPoint,
    /// Top-left of the displayed page in the viewport
    pub page_origin: ScreenPoint,
    /// Scroll offset of the viewport over its content
    pub scroll: ScreenPoint,
    /// Visible viewport size
    pub viewport: (f32, f32),
}

impl PointerSample {
    /// Pointer relative to the displayed page
    #[must_use]
    pub fn on_page(&self) -> ScreenPoint {
        ScreenPoint::new(
            self.pointer.x - self.page_origin.x,
            self.pointer.y - self.page_origin.y,
        )
    }
}

/// Where the loupe goes, in scrolled content coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoupePlacement {
    pub left: f32,
    pub top: f32,
    /// True when flipped below the pointer
    pub below: bool,
}

/// Everything needed to draw and position the loupe
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoupeView {
    pub source: PixelRect,
    pub placement: LoupePlacement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MagnifierMode {
    Disabled,
    Idle,
    Tracking,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MagnifierState {
    enabled: bool,
    visible: bool,
    view: Option<LoupeView>,
}

impl MagnifierState {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mode(&self) -> MagnifierMode {
        match (self.enabled, self.visible) {
            (false, _) => MagnifierMode::Disabled,
            (true, false) => MagnifierMode::Idle,
            (true, true) => MagnifierMode::Tracking,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Last computed view, while tracking
    #[must_use]
    pub fn view(&self) -> Option<LoupeView> {
        if self.visible { self.view } else { None }
    }

    /// Flip the feature; returns true when this hid a visible loupe
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        if self.enabled {
            return false;
        }
        let was_visible = self.visible;
        self.visible = false;
        self.view = None;
        was_visible
    }

    pub fn pointer_enter(&mut self) {
        if self.enabled {
            self.visible = true;
        }
    }

    /// Returns true when this hid a visible loupe
    pub fn pointer_leave(&mut self) -> bool {
        let was_visible = self.visible;
        self.visible = false;
        self.view = None;
        was_visible
    }

    /// Forget the current view but keep tracking; returns true when one was shown
    pub fn clear_view(&mut self) -> bool {
        self.view.take().is_some()
    }

    /// Recompute the view for a pointer move; `None` when not tracking or off-page
    pub fn track(&mut self, sample: &PointerSample, transform: &ViewTransform) -> Option<LoupeView> {
        if !self.visible {
            return None;
        }
        let (x, y) = transform.screen_to_page(sample.on_page())?;
        let (width, height) = transform.surface_size();

        let view = LoupeView {
            source: source_region(x, y, width, height),
            placement: placement(sample),
        };
        self.view = Some(view);
        Some(view)
    }
}

/// The source square centred on a page position, kept inside the surface
#[must_use]
pub fn source_region(x: f32, y: f32, width: u32, height: u32) -> PixelRect {
    let axis = |center: f32, extent: u32| -> (u32, u32) {
        let side = LOUPE_SOURCE_SIZE.min(extent);
        let start = (center.floor() as i64 - i64::from(side / 2)).clamp(0, i64::from(extent - side));
        (start as u32, side)
    };
    let (left, side_x) = axis(x, width);
    let (top, side_y) = axis(y, height);
    PixelRect::new(left, top, side_x, side_y)
}

/// Centred above the pointer, flipped below without room, clamped to the viewport
#[must_use]
pub fn placement(sample: &PointerSample) -> LoupePlacement {
    let size = LOUPE_SIZE as f32;
    let content_x = sample.pointer.x + sample.scroll.x;
    let content_y = sample.pointer.y + sample.scroll.y;

    let below = sample.pointer.y - size - LOUPE_GAP < 0.0;
    let top = if below {
        content_y + LOUPE_GAP
    } else {
        content_y - size - LOUPE_GAP
    };

    let min_left = sample.scroll.x;
    let max_left = (sample.scroll.x + sample.viewport.0 - size).max(min_left);
    let left = (content_x - size / 2.0).clamp(min_left, max_left);

    LoupePlacement { left, top, below }
}

/// Magnify `region` of `source` into `loupe`, with grid and crosshair.
///
/// Returns false (leaving the loupe untouched) if the region is not inside
/// the source.
pub fn render_loupe<S, L>(source: &S, region: PixelRect, loupe: &mut L) -> bool
where
    S: Surface + ?Sized,
    L: Surface + ?Sized,
{
    let Some(patch) = source.copy_region(region) else {
        return false;
    };

    let backdrop = BACKDROP.repeat((LOUPE_SIZE * LOUPE_SIZE) as usize);
    if loupe.replace_image(LOUPE_SIZE, LOUPE_SIZE, &backdrop).is_err() {
        return false;
    }
    loupe.draw_scaled(
        &patch,
        PixelRect::new(0, 0, region.width * LOUPE_SCALE, region.height * LOUPE_SCALE),
    );

    for offset in (0..LOUPE_SIZE).step_by(LOUPE_SCALE as usize) {
        loupe.blend_rect(PixelRect::new(offset, 0, 1, LOUPE_SIZE), GRID_COLOR);
        loupe.blend_rect(PixelRect::new(0, offset, LOUPE_SIZE, 1), GRID_COLOR);
    }

    let center = LOUPE_SIZE / 2 - CROSSHAIR_WIDTH / 2;
    loupe.blend_rect(
        PixelRect::new(0, center, LOUPE_SIZE, CROSSHAIR_WIDTH),
        CROSSHAIR_COLOR,
    );
    loupe.blend_rect(
        PixelRect::new(center, 0, CROSSHAIR_WIDTH, LOUPE_SIZE),
        CROSSHAIR_COLOR,
    );
    true
}
