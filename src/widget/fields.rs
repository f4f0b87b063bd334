use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::settings::RegionConfig;
use crate::theme::Base16Palette;

/// Read-only side panel listing the fields bound to regions
pub struct FieldsPanel<'a> {
    fields: &'a [RegionConfig],
    focused: Option<&'a str>,
    palette: &'a Base16Palette,
}

impl<'a> FieldsPanel<'a> {
    pub fn new(fields: &'a [RegionConfig], focused: Option<&'a str>, palette: &'a Base16Palette) -> Self {
        Self {
            fields,
            focused,
            palette,
        }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for field in self.fields {
            let is_focused = self.focused == Some(field.id.as_str());
            let (text, border, _) = self.palette.get_panel_colors(is_focused);
            let marker = if is_focused { "▶ " } else { "  " };

            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(self.palette.base_0a)),
                Span::styled(
                    field.label.clone(),
                    Style::default().fg(text).add_modifier(Modifier::BOLD),
                ),
            ]));

            let value = if field.value.is_empty() {
                "—".to_string()
            } else {
                field.value.clone()
            };
            let mut value_style = Style::default().fg(text).bg(self.palette.base_01);
            if is_focused {
                value_style = value_style.bg(border).fg(self.palette.base_00);
            }
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(format!(" {value} "), value_style),
            ]));
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for FieldsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (_, border, bg) = self.palette.get_panel_colors(self.focused.is_some());
        let block = Block::default()
            .title(" Fields ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(bg));
        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelPoint;
    use crate::theme::current_theme;

    fn field(id: &str, label: &str, value: &str) -> RegionConfig {
        RegionConfig {
            id: id.into(),
            label: label.into(),
            value: value.into(),
            top_left: PixelPoint::new(0, 0),
            bottom_right: PixelPoint::new(1, 1),
        }
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn focused_field_is_marked() {
        let fields = [field("name", "Name", "Ada"), field("date", "Date", "")];
        let mut buf = Buffer::empty(Rect::new(0, 0, 24, 10));
        FieldsPanel::new(&fields, Some("date"), current_theme()).render(buf.area, &mut buf);

        assert!(row(&buf, 1).contains("  Name"));
        assert!(row(&buf, 2).contains("Ada"));
        assert!(row(&buf, 4).contains("▶ Date"));
    }
}
