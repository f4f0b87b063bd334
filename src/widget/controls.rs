use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::Widget,
};

use crate::theme::Base16Palette;
use crate::viewer::{Control, Controls};

/// The button row above the page
pub struct ControlBar<'a> {
    controls: Controls,
    zoom_label: String,
    magnifier_on: bool,
    palette: &'a Base16Palette,
}

impl<'a> ControlBar<'a> {
    pub fn new(
        controls: Controls,
        zoom_label: String,
        magnifier_on: bool,
        palette: &'a Base16Palette,
    ) -> Self {
        Self {
            controls,
            zoom_label,
            magnifier_on,
            palette,
        }
    }

    fn label(&self, control: Control) -> String {
        match control {
            Control::PreviousPage => " ◀ Prev ".to_string(),
            Control::NextPage => " Next ▶ ".to_string(),
            Control::ZoomOut => " − ".to_string(),
            Control::ZoomReset => format!(" {} ", self.zoom_label),
            Control::ZoomIn => " + ".to_string(),
            Control::ToggleMagnifier => {
                if self.magnifier_on {
                    " Loupe: on ".to_string()
                } else {
                    " Loupe: off ".to_string()
                }
            }
        }
    }

    /// Screen rectangle of every button, for hit-testing clicks
    pub fn layout(&self, area: Rect) -> Vec<(Control, Rect)> {
        let mut x = area.x;
        let mut hits = Vec::new();
        for control in Control::ALL {
            let width = self.label(control).chars().count() as u16;
            if x + width > area.right() {
                break;
            }
            hits.push((control, Rect::new(x, area.y, width, 1)));
            x += width + 1;
        }
        hits
    }
}

impl Widget for ControlBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(self.palette.base_01));
        for (control, rect) in self.layout(area) {
            let enabled = self.controls.is_enabled(control);
            let active = control == Control::ToggleMagnifier && self.magnifier_on;
            let (fg, bg) = self.palette.get_button_colors(enabled, active);
            let mut style = Style::default().fg(fg).bg(bg);
            if enabled {
                style = style.add_modifier(Modifier::BOLD);
            }
            Span::styled(self.label(control), style).render(rect, buf);
        }
    }
}

/// Control under a terminal cell
pub fn hit_control(hits: &[(Control, Rect)], column: u16, row: u16) -> Option<Control> {
    hits.iter()
        .find(|(_, rect)| {
            column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
        })
        .map(|(control, _)| *control)
}
