//! Terminal front-end
//!
//! [`App`] owns a [`Session`] and forwards its jobs either to the background
//! [`RenderService`] or, for tests, runs them on the calling thread. Mouse
//! positions are converted from terminal cells to screen pixels with the
//! canvas cell geometry, so the canvas, the loupe and region hits all agree.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::event_source::{
    Event, EventSource, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crate::fetch::{Fetcher, SourceLocation};
use crate::geometry::ScreenPoint;
use crate::magnifier::PointerSample;
use crate::page::{PageDecoder, RenderResponse, RenderService, ServiceConfig, TiffDecoder, load_pages};
use crate::regions::RegionSet;
use crate::settings::RegionConfig;
use crate::theme::current_theme;
use crate::viewer::{Command, Control, Job, Session, ViewerState};
use crate::widget::canvas::{area_px, cell_center};
use crate::widget::loupe::loupe_origin;
use crate::widget::{
    CELL_HEIGHT_PX, CELL_WIDTH_PX, ControlBar, FieldsPanel, HudMessage, LoupePopup, PageCanvas,
    hit_control,
};

const FIELDS_PANEL_WIDTH: u16 = 30;
const WHEEL_ROWS: f32 = 3.0;
const KEY_SCROLL_CELLS: f32 = 4.0;

/// Everything the app needs to start
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub source: Option<SourceLocation>,
    pub fields: Vec<RegionConfig>,
    pub regions: RegionSet,
    pub magnifier_enabled: bool,
    /// 0-based page shown once the first load succeeds
    pub initial_page: Option<usize>,
    pub service: ServiceConfig,
}

enum Renderer {
    Background(RenderService),
    Inline {
        fetcher: Fetcher,
        decoder: Arc<dyn PageDecoder>,
    },
}

pub struct App {
    session: Session,
    renderer: Renderer,
    source: Option<SourceLocation>,
    fields: Vec<RegionConfig>,
    initial_page: Option<usize>,
    scroll: ScreenPoint,
    /// Inner page area from the last draw
    viewport: Rect,
    control_hits: Vec<(Control, Rect)>,
    pointer_on_page: bool,
    last_mouse: Option<(u16, u16)>,
    hud: Option<HudMessage>,
    shown_error: Option<String>,
    should_quit: bool,
}

impl App {
    /// App rendering on a background worker thread
    pub fn new(config: AppConfig) -> Self {
        let service = RenderService::new(config.service, Arc::new(TiffDecoder));
        Self::with_renderer(config, Renderer::Background(service))
    }

    /// App that fetches, decodes and renders on the calling thread
    pub fn new_inline(config: AppConfig, decoder: Arc<dyn PageDecoder>) -> Self {
        let fetcher = Fetcher::new(config.service.fetch_timeout);
        Self::with_renderer(config, Renderer::Inline { fetcher, decoder })
    }

    fn with_renderer(config: AppConfig, renderer: Renderer) -> Self {
        let state = ViewerState::new(config.regions, config.magnifier_enabled);
        Self {
            session: Session::new(state, Default::default()),
            renderer,
            source: config.source,
            fields: config.fields,
            initial_page: config.initial_page,
            scroll: ScreenPoint::default(),
            viewport: Rect::default(),
            control_hits: Vec::new(),
            pointer_on_page: false,
            last_mouse: None,
            hud: None,
            shown_error: None,
            should_quit: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn scroll(&self) -> ScreenPoint {
        self.scroll
    }

    pub fn hud(&self) -> Option<&HudMessage> {
        self.hud.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Kick off the first load
    pub fn start(&mut self) {
        self.reload();
    }

    fn reload(&mut self) {
        if self.source.is_none() {
            self.hud = Some(HudMessage::error("No source given"));
            return;
        }
        self.scroll = ScreenPoint::default();
        self.apply(Command::BeginLoad);
    }

    fn apply(&mut self, cmd: Command) {
        let focused_before = self.session.state().focused_field().map(str::to_string);
        let jobs = self.session.dispatch(cmd);
        self.submit(jobs);
        self.clamp_scroll();
        self.sync_feedback(focused_before.as_deref());
    }

    fn submit(&mut self, jobs: Vec<Job>) {
        let mut queue: VecDeque<Job> = jobs.into();
        while let Some(job) = queue.pop_front() {
            match (&self.renderer, job) {
                (Renderer::Background(service), Job::Load { generation }) => {
                    if let Some(source) = &self.source {
                        service.request_load(generation, source.clone());
                    }
                }
                (Renderer::Background(service), Job::Render { ticket, descriptor }) => {
                    service.request_page(ticket, descriptor);
                }
                (Renderer::Inline { fetcher, decoder }, Job::Load { generation }) => {
                    let Some(source) = &self.source else {
                        continue;
                    };
                    let result = load_pages(fetcher, decoder.as_ref(), source);
                    queue.extend(self.session.finish_load(generation, result));
                    queue.extend(show_initial_page(&mut self.session, &mut self.initial_page));
                }
                (Renderer::Inline { .. }, job @ Job::Render { .. }) => {
                    self.session.run_jobs(vec![job]);
                }
            }
        }
    }

    /// Collect worker responses; true when anything arrived
    pub fn poll_renders(&mut self) -> bool {
        let Renderer::Background(service) = &self.renderer else {
            return false;
        };
        let responses = service.poll_responses();
        if responses.is_empty() {
            return false;
        }

        let focused_before = self.session.state().focused_field().map(str::to_string);
        let mut jobs = Vec::new();
        for response in responses {
            match response {
                RenderResponse::Loaded { generation, result } => {
                    jobs.extend(self.session.finish_load(generation, result));
                    jobs.extend(show_initial_page(&mut self.session, &mut self.initial_page));
                }
                RenderResponse::Page {
                    ticket,
                    result,
                    elapsed,
                } => {
                    jobs.extend(self.session.finish_render(ticket, result, elapsed));
                }
                RenderResponse::Cancelled(ticket) => {
                    debug!("Render of page {} was superseded", ticket.page);
                }
            }
        }
        self.submit(jobs);
        self.clamp_scroll();
        self.sync_feedback(focused_before.as_deref());
        true
    }

    /// Expire the HUD; true when it changed
    pub fn tick(&mut self) -> bool {
        if self.hud.as_ref().is_some_and(HudMessage::is_expired) {
            self.hud = None;
            return true;
        }
        false
    }

    fn sync_feedback(&mut self, focused_before: Option<&str>) {
        let state = self.session.state();
        let error = state.error().map(str::to_string);
        if error != self.shown_error {
            if let Some(message) = &error {
                self.hud = Some(HudMessage::error(message.clone()));
            }
            self.shown_error = error;
        }

        let focused = state.focused_field();
        if focused != focused_before {
            if let Some(field) = self.fields.iter().find(|f| Some(f.id.as_str()) == focused) {
                self.hud = Some(HudMessage::info(format!("Editing {}", field.label)));
            }
        }
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left if shift => self.scroll_by(-KEY_SCROLL_CELLS * CELL_WIDTH_PX, 0.0),
            KeyCode::Right if shift => self.scroll_by(KEY_SCROLL_CELLS * CELL_WIDTH_PX, 0.0),
            KeyCode::Up if shift => self.scroll_by(0.0, -KEY_SCROLL_CELLS * CELL_HEIGHT_PX),
            KeyCode::Down if shift => self.scroll_by(0.0, KEY_SCROLL_CELLS * CELL_HEIGHT_PX),
            KeyCode::Char('H') => self.scroll_by(-KEY_SCROLL_CELLS * CELL_WIDTH_PX, 0.0),
            KeyCode::Char('L') => self.scroll_by(KEY_SCROLL_CELLS * CELL_WIDTH_PX, 0.0),
            KeyCode::Char('K') => self.scroll_by(0.0, -KEY_SCROLL_CELLS * CELL_HEIGHT_PX),
            KeyCode::Char('J') => self.scroll_by(0.0, KEY_SCROLL_CELLS * CELL_HEIGHT_PX),
            KeyCode::Char('n' | 'l') | KeyCode::Right => {
                self.apply(Command::Control(Control::NextPage));
            }
            KeyCode::Char('p' | 'h') | KeyCode::Left => {
                self.apply(Command::Control(Control::PreviousPage));
            }
            KeyCode::Char('+' | '=') => self.apply(Command::Control(Control::ZoomIn)),
            KeyCode::Char('-') => self.apply(Command::Control(Control::ZoomOut)),
            KeyCode::Char('0') => self.apply(Command::Control(Control::ZoomReset)),
            KeyCode::Char('m') => self.apply(Command::Control(Control::ToggleMagnifier)),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Tab => self.apply(Command::FocusNextField),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => self.update_pointer(column, row),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(control) = hit_control(&self.control_hits, column, row) {
                    self.apply(Command::Control(control));
                } else if let Some(sample) = self.sample_at(column, row) {
                    self.apply(Command::Clicked(sample));
                }
            }
            MouseEventKind::ScrollDown => self.scroll_by(0.0, WHEEL_ROWS * CELL_HEIGHT_PX),
            MouseEventKind::ScrollUp => self.scroll_by(0.0, -WHEEL_ROWS * CELL_HEIGHT_PX),
            MouseEventKind::ScrollRight => self.scroll_by(WHEEL_ROWS * CELL_WIDTH_PX, 0.0),
            MouseEventKind::ScrollLeft => self.scroll_by(-WHEEL_ROWS * CELL_WIDTH_PX, 0.0),
            _ => {}
        }
    }

    /// Pointer sample for a terminal cell inside the page viewport
    fn sample_at(&self, column: u16, row: u16) -> Option<PointerSample> {
        let vp = self.viewport;
        if column < vp.x || column >= vp.right() || row < vp.y || row >= vp.bottom() {
            return None;
        }
        Some(PointerSample {
            pointer: cell_center(column - vp.x, row - vp.y),
            page_origin: ScreenPoint::new(-self.scroll.x, -self.scroll.y),
            scroll: self.scroll,
            viewport: area_px(vp),
        })
    }

    fn update_pointer(&mut self, column: u16, row: u16) {
        self.last_mouse = Some((column, row));
        let over_page = self.sample_at(column, row).filter(|sample| {
            self.session
                .state()
                .view_transform()
                .is_some_and(|t| t.display_bounds().contains(sample.on_page()))
        });

        match over_page {
            Some(sample) => {
                if !self.pointer_on_page {
                    self.pointer_on_page = true;
                    self.apply(Command::PointerEntered);
                }
                self.apply(Command::PointerMoved(sample));
            }
            None => {
                if self.pointer_on_page {
                    self.pointer_on_page = false;
                    self.apply(Command::PointerLeft);
                }
            }
        }
    }

    /// Replay the last mouse position after the content moved under it
    fn refresh_pointer(&mut self) {
        if let Some((column, row)) = self.last_mouse {
            self.update_pointer(column, row);
        }
    }

    fn scroll_by(&mut self, dx: f32, dy: f32) {
        self.scroll.x += dx;
        self.scroll.y += dy;
        self.clamp_scroll();
        self.refresh_pointer();
    }

    fn clamp_scroll(&mut self) {
        let (view_w, view_h) = area_px(self.viewport);
        let (page_w, page_h) = self
            .session
            .state()
            .view_transform()
            .map_or((0.0, 0.0), |t| t.display_size());
        self.scroll.x = self.scroll.x.clamp(0.0, (page_w - view_w).max(0.0));
        self.scroll.y = self.scroll.y.clamp(0.0, (page_h - view_h).max(0.0));
    }

    fn status_text(&self) -> String {
        let state = self.session.state();
        if state.is_loading() {
            return match state.status() {
                Some(status) => format!("Loading… | {status}"),
                None => "Loading…".to_string(),
            };
        }
        match (state.error(), state.status()) {
            (Some(error), _) => format!("Error: {error}"),
            (None, Some(status)) => status.to_string(),
            (None, None) => "No page loaded".to_string(),
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = current_theme();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(f.area());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(FIELDS_PANEL_WIDTH)])
            .split(chunks[1]);

        let state = self.session.state();
        let bar = ControlBar::new(
            state.controls(),
            state.zoom().percent_label(),
            state.magnifier().is_enabled(),
            palette,
        );
        self.control_hits = bar.layout(chunks[0]);
        f.render_widget(bar, chunks[0]);

        let (_, border, bg) = palette.get_panel_colors(true);
        let title = match &self.source {
            Some(source) => format!(" {source} "),
            None => " Page ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let viewport = block.inner(body[0]);
        f.render_widget(block, body[0]);
        self.viewport = viewport;
        self.clamp_scroll();

        let state = self.session.state();
        let canvas = PageCanvas::new(self.session.surface(), state.view_transform(), state.regions())
            .scroll(self.scroll)
            .focused(state.focused_field())
            .background(bg);
        f.render_widget(canvas, viewport);

        if let Some(view) = state.magnifier().view() {
            let origin = loupe_origin(&view.placement, self.scroll);
            f.render_widget(LoupePopup::new(self.session.loupe(), origin, palette.base_0d), viewport);
        }

        f.render_widget(
            FieldsPanel::new(&self.fields, state.focused_field(), palette),
            body[1],
        );

        let status = match self.hud.as_ref().filter(|hud| !hud.is_expired()) {
            Some(hud) => hud.styled_line(palette),
            None => Line::from(vec![
                Span::styled(
                    format!(" {} ", self.status_text()),
                    Style::default().fg(palette.base_05),
                ),
                Span::styled(
                    "  n/p page  +/-/0 zoom  m loupe  Tab field  q quit",
                    Style::default().fg(palette.base_03),
                ),
            ]),
        };
        f.render_widget(
            Paragraph::new(status).style(Style::default().bg(palette.base_01)),
            chunks[2],
        );
    }
}

fn show_initial_page(session: &mut Session, initial_page: &mut Option<usize>) -> Vec<Job> {
    if !session.state().navigation().has_pages() {
        return vec![];
    }
    match initial_page.take() {
        Some(page) => {
            info!("Opening page {}", page + 1);
            session.dispatch(Command::GoToPage(page))
        }
        None => vec![],
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut needs_redraw = true;
    loop {
        needs_redraw |= app.poll_renders();
        needs_redraw |= app.tick();
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        let mut events_processed = 0;
        while event_source.poll(Duration::ZERO)? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            app.handle_event(&event);
            if app.should_quit() {
                terminal.draw(|f| app.draw(f))?;
                return Ok(());
            }
        }

        if events_processed > 0 {
            needs_redraw = true;
        } else {
            let _ = event_source.poll(tick_rate)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::test_utils::fixtures::tiff_file;
    use crate::test_utils::test_helpers::{
        TestScenarioBuilder, capture_terminal_state, create_test_terminal,
    };

    fn inline_app(source: SourceLocation) -> App {
        let settings = Settings::default();
        let config = AppConfig {
            source: Some(source),
            regions: settings.region_set().unwrap(),
            fields: settings.regions,
            magnifier_enabled: true,
            initial_page: None,
            service: ServiceConfig::default(),
        };
        let mut app = App::new_inline(config, Arc::new(TiffDecoder));
        app.start();
        app
    }

    #[test]
    fn keys_drive_navigation() {
        let file = tiff_file(&[(300, 300), (150, 150)]);
        let mut app = inline_app(SourceLocation::Path(file.path().to_path_buf()));
        let mut terminal = create_test_terminal(120, 40);
        let mut events = TestScenarioBuilder::new().next_page().next_page().quit().build();

        run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

        let state = app.session().state();
        assert_eq!(state.navigation().current(), 1);
        assert!(!state.controls().next);
        assert!(capture_terminal_state(&terminal).contains("Page 2/2 | Render time:"));
    }

    #[test]
    fn missing_source_shows_error() {
        let mut app = inline_app(SourceLocation::Path("/nonexistent/pageloupe.tif".into()));
        let mut terminal = create_test_terminal(120, 40);
        let mut events = TestScenarioBuilder::new().quit().build();

        run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

        assert!(app.session().state().error().is_some());
        assert!(!app.session().state().is_loading());
    }

    #[test]
    fn mouse_over_page_shows_loupe_and_wheel_scrolls() {
        let file = tiff_file(&[(400, 600)]);
        let mut app = inline_app(SourceLocation::Path(file.path().to_path_buf()));
        let mut terminal = create_test_terminal(120, 40);
        // Viewport starts at (1, 2); cell (20, 25) is inside the page
        let mut events = TestScenarioBuilder::new().move_mouse(20, 25).quit().build();
        run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
        assert!(app.session().state().magnifier().is_visible());
        assert!(!app.session().loupe().is_empty());

        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 20,
            row: 25,
            modifiers: KeyModifiers::empty(),
        });
        assert_eq!(app.scroll().y, 24.0);
    }
}
