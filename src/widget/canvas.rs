//! Page canvas widget
//!
//! Paints the page surface into terminal cells with upper half blocks: the
//! foreground colour is the top half of a cell, the background the bottom
//! half. One cell covers [`CELL_WIDTH_PX`] x [`CELL_HEIGHT_PX`] screen
//! pixels, so every cell samples two screen points. Region outlines are
//! blended into the samples that fall on a rectangle's border band.

use image::Rgba;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::geometry::{ScreenPoint, ScreenRect};
use crate::regions::RegionSet;
use crate::surface::RasterSurface;
use crate::viewer::ViewTransform;

/// Screen pixels per terminal column
pub const CELL_WIDTH_PX: f32 = 4.0;
/// Screen pixels per terminal row
pub const CELL_HEIGHT_PX: f32 = 8.0;

const UPPER_HALF: &str = "▀";
const REGION_COLOR: Rgba<u8> = Rgba([0x66, 0x99, 0xCC, 200]);
const FOCUSED_REGION_COLOR: Rgba<u8> = Rgba([0xFA, 0xC8, 0x63, 255]);

/// Screen position of the centre of a cell, relative to the area origin
#[must_use]
pub fn cell_center(column: u16, row: u16) -> ScreenPoint {
    ScreenPoint::new(
        f32::from(column) * CELL_WIDTH_PX + CELL_WIDTH_PX / 2.0,
        f32::from(row) * CELL_HEIGHT_PX + CELL_HEIGHT_PX / 2.0,
    )
}

/// The two sample points of a cell: top half, bottom half
fn cell_samples(column: u16, row: u16) -> (ScreenPoint, ScreenPoint) {
    let center = cell_center(column, row);
    let quarter = CELL_HEIGHT_PX / 4.0;
    (
        ScreenPoint::new(center.x, center.y - quarter),
        ScreenPoint::new(center.x, center.y + quarter),
    )
}

/// Size of an area in screen pixels
#[must_use]
pub fn area_px(area: Rect) -> (f32, f32) {
    (
        f32::from(area.width) * CELL_WIDTH_PX,
        f32::from(area.height) * CELL_HEIGHT_PX,
    )
}

pub(crate) fn to_color(px: Rgba<u8>, background: Color) -> Color {
    let [r, g, b, a] = px.0;
    if a == 255 {
        return Color::Rgb(r, g, b);
    }
    let Color::Rgb(br, bg, bb) = background else {
        return Color::Rgb(r, g, b);
    };
    let mix = |fg: u8, bg: u8| -> u8 {
        ((u16::from(fg) * u16::from(a) + u16::from(bg) * (255 - u16::from(a))) / 255) as u8
    };
    Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
}

fn blend(base: Rgba<u8>, over: Rgba<u8>) -> Rgba<u8> {
    let alpha = u16::from(over.0[3]);
    let mut out = base;
    for i in 0..3 {
        out.0[i] = ((u16::from(over.0[i]) * alpha + u16::from(base.0[i]) * (255 - alpha)) / 255) as u8;
    }
    out.0[3] = base.0[3].max(over.0[3]);
    out
}

/// True when `point` lies on the outline band of `rect`
fn on_outline(rect: &ScreenRect, point: ScreenPoint) -> bool {
    if !rect.contains(point) {
        return false;
    }
    point.x < rect.x + CELL_WIDTH_PX
        || point.x >= rect.right() - CELL_WIDTH_PX
        || point.y < rect.y + CELL_HEIGHT_PX / 2.0
        || point.y >= rect.bottom() - CELL_HEIGHT_PX / 2.0
}

pub struct PageCanvas<'a> {
    surface: &'a RasterSurface,
    transform: Option<ViewTransform>,
    scroll: ScreenPoint,
    regions: &'a RegionSet,
    focused: Option<&'a str>,
    background: Color,
}

impl<'a> PageCanvas<'a> {
    pub fn new(surface: &'a RasterSurface, transform: Option<ViewTransform>, regions: &'a RegionSet) -> Self {
        Self {
            surface,
            transform,
            scroll: ScreenPoint::default(),
            regions,
            focused: None,
            background: Color::Rgb(0, 0, 0),
        }
    }

    pub fn scroll(mut self, scroll: ScreenPoint) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, field: Option<&'a str>) -> Self {
        self.focused = field;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Colour of the page at a content-space point, `None` off the page
    fn sample(&self, transform: &ViewTransform, outlines: &[(ScreenRect, bool)], point: ScreenPoint) -> Option<Rgba<u8>> {
        let (x, y) = transform.screen_to_page(point)?;
        let mut px = self.surface.pixel(x as u32, y as u32)?;
        for (rect, focused) in outlines {
            if on_outline(rect, point) {
                let color = if *focused { FOCUSED_REGION_COLOR } else { REGION_COLOR };
                px = blend(px, color);
            }
        }
        Some(px)
    }
}

impl Widget for PageCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                buf[(x, y)].set_symbol(" ").set_bg(self.background);
            }
        }
        let Some(transform) = self.transform else {
            return;
        };
        if self.surface.is_empty() {
            return;
        }

        let outlines: Vec<(ScreenRect, bool)> = self
            .regions
            .iter()
            .map(|region| {
                (
                    transform.rect_to_screen(region.bounds()),
                    Some(region.field()) == self.focused,
                )
            })
            .collect();

        for row in 0..area.height {
            for column in 0..area.width {
                let (top, bottom) = cell_samples(column, row);
                let shift = |p: ScreenPoint| ScreenPoint::new(p.x + self.scroll.x, p.y + self.scroll.y);
                let upper = self.sample(&transform, &outlines, shift(top));
                let lower = self.sample(&transform, &outlines, shift(bottom));
                if upper.is_none() && lower.is_none() {
                    continue;
                }

                let fg = upper.map_or(self.background, |px| to_color(px, self.background));
                let bg = lower.map_or(self.background, |px| to_color(px, self.background));
                buf[(area.x + column, area.y + row)]
                    .set_symbol(UPPER_HALF)
                    .set_fg(fg)
                    .set_bg(bg);
            }
        }
    }
}
