//! Viewer state management
//!
//! [`ViewerState`] is a plain record. Every input arrives as a [`Command`]
//! and [`ViewerState::apply`] answers with the [`Effect`]s the caller has to
//! carry out (fetch, render, redraw the loupe, move focus). No I/O happens
//! here, so every transition can be tested directly.

use std::time::Duration;

use log::{debug, warn};

use super::navigation::Navigation;
use super::transform::ViewTransform;
use super::zoom::Zoom;
use crate::magnifier::{LoupeView, MagnifierState, PointerSample};
use crate::page::{RenderTicket, RequestId, render_status};
use crate::regions::RegionSet;

/// A user-facing control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    PreviousPage,
    NextPage,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ToggleMagnifier,
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::PreviousPage,
        Control::NextPage,
        Control::ZoomOut,
        Control::ZoomReset,
        Control::ZoomIn,
        Control::ToggleMagnifier,
    ];
}

/// Which controls currently accept input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub previous: bool,
    pub next: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub zoom_reset: bool,
    pub magnifier: bool,
}

impl Controls {
    #[must_use]
    pub fn is_enabled(&self, control: Control) -> bool {
        match control {
            Control::PreviousPage => self.previous,
            Control::NextPage => self.next,
            Control::ZoomIn => self.zoom_in,
            Control::ZoomOut => self.zoom_out,
            Control::ZoomReset => self.zoom_reset,
            Control::ToggleMagnifier => self.magnifier,
        }
    }
}

/// Inputs to the viewer state
#[derive(Clone, Debug)]
pub enum Command {
    /// Start (re)loading the source
    BeginLoad,
    /// A load finished; `Ok` carries the page count
    LoadFinished {
        generation: u64,
        result: Result<usize, String>,
    },
    /// A control was activated
    Control(Control),
    /// Jump to a page (clamped); not gated by the loading flag
    GoToPage(usize),
    /// A render finished; `Ok` carries the committed surface size
    RenderFinished {
        ticket: RenderTicket,
        result: Result<(u32, u32), String>,
        elapsed: Duration,
    },
    PointerEntered,
    PointerLeft,
    PointerMoved(PointerSample),
    Clicked(PointerSample),
    /// Move focus to the next region field
    FocusNextField,
}

/// Work requested by a state transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Fetch and split the source for this generation
    Load { generation: u64 },
    /// Render the ticket's page
    Render(RenderTicket),
    /// Redraw the loupe for this view
    DrawLoupe(LoupeView),
    /// Clear the loupe
    HideLoupe,
    /// Focus the named field
    FocusField(String),
}

#[derive(Clone, Debug)]
pub struct ViewerState {
    loading: bool,
    error: Option<String>,
    status: Option<String>,
    generation: u64,
    navigation: Navigation,
    zoom: Zoom,
    magnifier: MagnifierState,
    /// Size of the last committed frame
    surface_size: Option<(u32, u32)>,
    regions: RegionSet,
    focused_field: Option<String>,
    last_pointer: Option<PointerSample>,
    next_request_id: u64,
    pending_render: Option<RenderTicket>,
}

impl ViewerState {
    #[must_use]
    pub fn new(regions: RegionSet, magnifier_enabled: bool) -> Self {
        Self {
            loading: false,
            error: None,
            status: None,
            generation: 0,
            navigation: Navigation::default(),
            zoom: Zoom::default(),
            magnifier: MagnifierState::new(magnifier_enabled),
            surface_size: None,
            regions,
            focused_field: None,
            last_pointer: None,
            next_request_id: 0,
            pending_render: None,
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::BeginLoad => {
                self.generation += 1;
                self.loading = true;
                self.error = None;
                self.status = None;
                self.navigation.clear();
                self.pending_render = None;
                debug!("Load generation {} started", self.generation);

                let mut effects = self.hide_loupe();
                effects.push(Effect::Load {
                    generation: self.generation,
                });
                effects
            }

            Command::LoadFinished { generation, result } => {
                if generation != self.generation {
                    warn!(
                        "Discarding load generation {generation}, current is {}",
                        self.generation
                    );
                    return vec![];
                }
                match result {
                    Ok(total) if total > 0 => {
                        self.navigation.reset(total);
                        vec![self.issue_render()]
                    }
                    Ok(_) => {
                        self.fail("Source contains no pages".to_string());
                        vec![]
                    }
                    Err(message) => {
                        self.fail(message);
                        vec![]
                    }
                }
            }

            Command::Control(control) => {
                if !self.controls().is_enabled(control) {
                    debug!("{control:?} ignored: disabled");
                    return vec![];
                }
                self.apply_control(control)
            }

            Command::GoToPage(page) => {
                if !self.navigation.go_to(page) {
                    return vec![];
                }
                vec![self.issue_render()]
            }

            Command::RenderFinished {
                ticket,
                result,
                elapsed,
            } => {
                if !self.accepts(&ticket) {
                    warn!(
                        "Discarding stale render of page {} (request {:?})",
                        ticket.page, ticket.id
                    );
                    return vec![];
                }
                self.pending_render = None;
                self.loading = false;
                self.status = Some(render_status(ticket.page, ticket.total, elapsed));
                match result {
                    Ok(size) => {
                        self.surface_size = Some(size);
                        self.error = None;
                        self.refresh_loupe()
                    }
                    Err(message) => {
                        self.error = Some(message);
                        vec![]
                    }
                }
            }

            Command::PointerEntered => {
                self.magnifier.pointer_enter();
                vec![]
            }

            Command::PointerLeft => {
                self.last_pointer = None;
                if self.magnifier.pointer_leave() {
                    vec![Effect::HideLoupe]
                } else {
                    vec![]
                }
            }

            Command::PointerMoved(sample) => {
                self.last_pointer = Some(sample);
                self.track(&sample)
            }

            Command::Clicked(sample) => {
                let Some(transform) = self.view_transform() else {
                    return vec![];
                };
                let Some((x, y)) = transform.screen_to_page(sample.on_page()) else {
                    return vec![];
                };
                match self.regions.hit(x, y) {
                    Some(region) => {
                        let field = region.field().to_string();
                        self.focused_field = Some(field.clone());
                        vec![Effect::FocusField(field)]
                    }
                    None => vec![],
                }
            }

            Command::FocusNextField => {
                let fields: Vec<&str> = self.regions.iter().map(|r| r.field()).collect();
                if fields.is_empty() {
                    return vec![];
                }
                let next = self
                    .focused_field
                    .as_deref()
                    .and_then(|current| fields.iter().position(|f| *f == current))
                    .map_or(0, |i| (i + 1) % fields.len());
                let field = fields[next].to_string();
                self.focused_field = Some(field.clone());
                vec![Effect::FocusField(field)]
            }
        }
    }

    fn apply_control(&mut self, control: Control) -> Vec<Effect> {
        match control {
            Control::NextPage => {
                if self.navigation.next() {
                    vec![self.issue_render()]
                } else {
                    vec![]
                }
            }
            Control::PreviousPage => {
                if self.navigation.previous() {
                    vec![self.issue_render()]
                } else {
                    vec![]
                }
            }
            Control::ZoomIn => {
                self.zoom.step_in();
                self.refresh_loupe()
            }
            Control::ZoomOut => {
                self.zoom.step_out();
                self.refresh_loupe()
            }
            Control::ZoomReset => {
                self.zoom.reset();
                self.refresh_loupe()
            }
            Control::ToggleMagnifier => {
                if self.magnifier.toggle() {
                    return vec![Effect::HideLoupe];
                }
                if self.magnifier.is_enabled() && self.last_pointer.is_some() {
                    self.magnifier.pointer_enter();
                    return self.refresh_loupe();
                }
                vec![]
            }
        }
    }

    fn issue_render(&mut self) -> Effect {
        self.next_request_id += 1;
        let ticket = RenderTicket {
            id: RequestId::new(self.next_request_id),
            generation: self.generation,
            page: self.navigation.current(),
            total: self.navigation.total(),
        };
        self.loading = true;
        self.pending_render = Some(ticket);
        debug!("Render {:?} issued for page {}", ticket.id, ticket.page);
        Effect::Render(ticket)
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    /// Take the loupe off screen without leaving the tracking state; the
    /// pointer is still over the viewport and the next move brings it back
    fn hide_loupe(&mut self) -> Vec<Effect> {
        if self.magnifier.clear_view() {
            vec![Effect::HideLoupe]
        } else {
            vec![]
        }
    }

    fn track(&mut self, sample: &PointerSample) -> Vec<Effect> {
        let Some(transform) = self.view_transform() else {
            return vec![];
        };
        match self.magnifier.track(sample, &transform) {
            Some(view) => vec![Effect::DrawLoupe(view)],
            None => vec![],
        }
    }

    /// Re-run tracking with the last pointer after the page or zoom changed
    fn refresh_loupe(&mut self) -> Vec<Effect> {
        match self.last_pointer {
            Some(sample) if self.magnifier.is_visible() => {
                let effects = self.track(&sample);
                if effects.is_empty() {
                    self.hide_loupe()
                } else {
                    effects
                }
            }
            _ => vec![],
        }
    }

    /// Whether a render result for `ticket` may touch the surface
    #[must_use]
    pub fn accepts(&self, ticket: &RenderTicket) -> bool {
        ticket.generation == self.generation
            && self.pending_render.is_some_and(|pending| pending.id == ticket.id)
    }

    #[must_use]
    pub fn controls(&self) -> Controls {
        let ready = !self.loading && self.navigation.has_pages();
        Controls {
            previous: ready && self.navigation.can_previous(),
            next: ready && self.navigation.can_next(),
            zoom_in: ready && self.zoom.can_step_in(),
            zoom_out: ready && self.zoom.can_step_out(),
            zoom_reset: ready && !self.zoom.is_default(),
            magnifier: true,
        }
    }

    /// Mapping for the frame currently on the surface
    #[must_use]
    pub fn view_transform(&self) -> Option<ViewTransform> {
        self.surface_size
            .map(|(width, height)| ViewTransform::new(self.zoom.factor(), width, height))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Last render status line
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    #[must_use]
    pub fn zoom(&self) -> &Zoom {
        &self.zoom
    }

    #[must_use]
    pub fn magnifier(&self) -> &MagnifierState {
        &self.magnifier
    }

    #[must_use]
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    #[must_use]
    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    #[must_use]
    pub fn focused_field(&self) -> Option<&str> {
        self.focused_field.as_deref()
    }

    #[must_use]
    pub fn pending_render(&self) -> Option<&RenderTicket> {
        self.pending_render.as_ref()
    }
}
