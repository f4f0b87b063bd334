use std::time::{Duration, Instant};

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::theme::Base16Palette;

const INFO_DURATION: Duration = Duration::from_secs(2);
const ERROR_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudMode {
    Normal,
    Error,
}

/// Short-lived message shown over the status line
#[derive(Debug, Clone)]
pub struct HudMessage {
    pub message: String,
    pub expires_at: Instant,
    pub mode: HudMode,
}

impl HudMessage {
    pub fn new(message: impl Into<String>, duration: Duration, mode: HudMode) -> Self {
        Self {
            message: message.into(),
            expires_at: Instant::now() + duration,
            mode,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, INFO_DURATION, HudMode::Normal)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ERROR_DURATION, HudMode::Error)
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn styled_line(&self, palette: &Base16Palette) -> Line<'static> {
        let style = match self.mode {
            HudMode::Normal => Style::default()
                .fg(palette.base_06)
                .bg(palette.base_02)
                .add_modifier(Modifier::BOLD),
            HudMode::Error => Style::default()
                .fg(palette.base_07)
                .bg(palette.base_08)
                .add_modifier(Modifier::BOLD),
        };

        Line::from(vec![Span::styled(format!(" {} ", self.message), style)]).centered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_expires_immediately() {
        let hud = HudMessage::new("gone", Duration::ZERO, HudMode::Normal);
        assert!(hud.is_expired());
        assert!(!HudMessage::error("still here").is_expired());
    }
}
