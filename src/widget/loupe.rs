//! Loupe popup
//!
//! Draws the loupe surface as a floating square over the page viewport.
//! The popup is purely visual: the app never routes pointer events to it.

use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use super::canvas::{CELL_HEIGHT_PX, CELL_WIDTH_PX, to_color};
use crate::geometry::ScreenPoint;
use crate::magnifier::{LOUPE_SIZE, LoupePlacement};
use crate::surface::RasterSurface;

/// Terminal columns/rows covered by the loupe
#[must_use]
pub fn loupe_cells() -> (u16, u16) {
    (
        (LOUPE_SIZE as f32 / CELL_WIDTH_PX) as u16,
        (LOUPE_SIZE as f32 / CELL_HEIGHT_PX) as u16,
    )
}

/// Top-left cell of the loupe relative to the viewport, possibly negative
#[must_use]
pub fn loupe_origin(placement: &LoupePlacement, scroll: ScreenPoint) -> (i32, i32) {
    (
        ((placement.left - scroll.x) / CELL_WIDTH_PX).floor() as i32,
        ((placement.top - scroll.y) / CELL_HEIGHT_PX).floor() as i32,
    )
}

pub struct LoupePopup<'a> {
    loupe: &'a RasterSurface,
    origin: (i32, i32),
    border: Color,
}

impl<'a> LoupePopup<'a> {
    pub fn new(loupe: &'a RasterSurface, origin: (i32, i32), border: Color) -> Self {
        Self {
            loupe,
            origin,
            border,
        }
    }
}

impl Widget for LoupePopup<'_> {
    /// `area` is the viewport; the popup is clipped to it
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.loupe.is_empty() {
            return;
        }
        let (columns, rows) = loupe_cells();
        let area = area.intersection(buf.area);

        for row in 0..rows {
            for column in 0..columns {
                let x = i32::from(area.x) + self.origin.0 + i32::from(column);
                let y = i32::from(area.y) + self.origin.1 + i32::from(row);
                if x < i32::from(area.left())
                    || x >= i32::from(area.right())
                    || y < i32::from(area.top())
                    || y >= i32::from(area.bottom())
                {
                    continue;
                }

                let px_x = (f32::from(column) * CELL_WIDTH_PX + CELL_WIDTH_PX / 2.0) as u32;
                let top_y = (f32::from(row) * CELL_HEIGHT_PX + CELL_HEIGHT_PX / 4.0) as u32;
                let bottom_y = (f32::from(row) * CELL_HEIGHT_PX + CELL_HEIGHT_PX * 0.75) as u32;
                let edge = column == 0 || row == 0 || column + 1 == columns || row + 1 == rows;

                let color = |y: u32| {
                    if edge {
                        self.border
                    } else {
                        self.loupe
                            .pixel(px_x, y)
                            .map_or(self.border, |px| to_color(px, self.border))
                    }
                };
                buf[(x as u16, y as u16)]
                    .set_symbol("▀")
                    .set_fg(color(top_y))
                    .set_bg(color(bottom_y));
            }
        }
    }
}
