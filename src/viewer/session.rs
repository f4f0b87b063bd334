//! Session - ties the viewer state to pages and surfaces
//!
//! The session executes the surface-side effects of a transition itself
//! (page commit, loupe redraw) and hands everything slow back to the caller
//! as [`Job`]s. The terminal app feeds jobs to the render service; headless
//! callers run them inline with [`Session::run_jobs`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::state::{Command, Effect, ViewerState};
use crate::fetch::{Fetcher, SourceBuffer, SourceLocation};
use crate::magnifier::render_loupe;
use crate::page::{
    LoadError, PageDecoder, PageDescriptor, PreparedFrame, RenderError, RenderPipeline,
    RenderTicket, decode_pages, load_pages,
};
use crate::surface::{RasterSurface, Surface};

/// Slow work a transition asked for
#[derive(Debug)]
pub enum Job {
    Load {
        generation: u64,
    },
    Render {
        ticket: RenderTicket,
        descriptor: PageDescriptor,
    },
}

pub struct Session<S: Surface = RasterSurface> {
    state: ViewerState,
    pages: Vec<PageDescriptor>,
    surface: S,
    loupe: RasterSurface,
    pipeline: RenderPipeline,
}

impl<S: Surface> Session<S> {
    #[must_use]
    pub fn new(state: ViewerState, surface: S) -> Self {
        Self {
            state,
            pages: Vec::new(),
            surface,
            loupe: RasterSurface::new(),
            pipeline: RenderPipeline::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn loupe(&self) -> &RasterSurface {
        &self.loupe
    }

    #[must_use]
    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    /// Apply a command, execute its surface effects, return pending jobs
    pub fn dispatch(&mut self, cmd: Command) -> Vec<Job> {
        let effects = self.state.apply(cmd);
        self.execute(effects)
    }

    fn execute(&mut self, effects: Vec<Effect>) -> Vec<Job> {
        let mut jobs = Vec::new();
        for effect in effects {
            match effect {
                Effect::Load { generation } => {
                    self.pages.clear();
                    jobs.push(Job::Load { generation });
                }
                Effect::Render(ticket) => match self.pages.get(ticket.page) {
                    Some(descriptor) => jobs.push(Job::Render {
                        ticket,
                        descriptor: descriptor.clone(),
                    }),
                    None => error!("Render issued for unknown page {}", ticket.page),
                },
                Effect::DrawLoupe(view) => {
                    if !render_loupe(&self.surface, view.source, &mut self.loupe) {
                        warn!("Loupe region {:?} is outside the page", view.source);
                    }
                }
                Effect::HideLoupe => self.loupe.clear(),
                Effect::FocusField(field) => info!("Focus moved to field '{field}'"),
            }
        }
        jobs
    }

    /// Deliver the outcome of a load job
    pub fn finish_load(
        &mut self,
        generation: u64,
        result: Result<Vec<PageDescriptor>, LoadError>,
    ) -> Vec<Job> {
        if generation != self.state.generation() {
            warn!("Ignoring pages from superseded load {generation}");
            return vec![];
        }
        let result = match result {
            Ok(pages) => {
                info!("Loaded {} page(s)", pages.len());
                let total = pages.len();
                self.pages = pages;
                Ok(total)
            }
            Err(e) => {
                error!("Load failed: {e}");
                Err(e.to_string())
            }
        };
        self.dispatch(Command::LoadFinished { generation, result })
    }

    /// Deliver the outcome of a render job; commits only the latest ticket.
    ///
    /// `prepared_in` is the time the job spent in the pipeline; the commit is
    /// timed here and added to it.
    pub fn finish_render(
        &mut self,
        ticket: RenderTicket,
        result: Result<Arc<PreparedFrame>, RenderError>,
        prepared_in: Duration,
    ) -> Vec<Job> {
        if !self.state.accepts(&ticket) {
            debug!("Dropping result of superseded render {:?}", ticket.id);
            return vec![];
        }
        let started = Instant::now();
        let result = result
            .and_then(|frame| {
                RenderPipeline::commit(&frame, &mut self.surface)?;
                Ok((frame.width, frame.height))
            })
            .map_err(|e| {
                error!("Render of page {} failed: {e}", ticket.page + 1);
                e.to_string()
            });
        let elapsed = prepared_in + started.elapsed();
        self.dispatch(Command::RenderFinished {
            ticket,
            result,
            elapsed,
        })
    }

    /// Run jobs inline until none are left; loads need a loader and are skipped
    pub fn run_jobs(&mut self, jobs: Vec<Job>) {
        let mut queue: VecDeque<Job> = jobs.into();
        while let Some(job) = queue.pop_front() {
            let more = match job {
                Job::Render { ticket, descriptor } => {
                    let started = Instant::now();
                    let result = self.pipeline.prepare(&descriptor).map(Arc::new);
                    self.finish_render(ticket, result, started.elapsed())
                }
                Job::Load { generation } => {
                    warn!("Load {generation} needs a loader, skipped");
                    vec![]
                }
            };
            queue.extend(more);
        }
    }

    /// Apply a command and run its jobs inline
    pub fn apply_blocking(&mut self, cmd: Command) {
        let jobs = self.dispatch(cmd);
        self.run_jobs(jobs);
    }

    /// Begin a load, obtain pages from `loader` and render the first page inline
    pub fn load_with<F>(&mut self, loader: F)
    where
        F: FnOnce() -> Result<Vec<PageDescriptor>, LoadError>,
    {
        let generation = self
            .dispatch(Command::BeginLoad)
            .into_iter()
            .find_map(|job| match job {
                Job::Load { generation } => Some(generation),
                Job::Render { .. } => None,
            })
            .unwrap_or_else(|| self.state.generation());
        let jobs = self.finish_load(generation, loader());
        self.run_jobs(jobs);
    }

    /// Load from an in-memory container
    pub fn load_buffer(&mut self, decoder: &dyn PageDecoder, buffer: &SourceBuffer) {
        self.load_with(|| decode_pages(decoder, buffer).map_err(LoadError::from));
    }

    /// Fetch and load a container on the calling thread
    pub fn load_source(
        &mut self,
        fetcher: &Fetcher,
        decoder: &dyn PageDecoder,
        source: &SourceLocation,
    ) {
        self.load_with(|| load_pages(fetcher, decoder, source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenPoint;
    use crate::magnifier::PointerSample;
    use crate::page::{RequestId, TiffDecoder};
    use crate::regions::RegionSet;
    use crate::test_utils::fixtures::{FakePage, tiff_container};
    use crate::viewer::Control;

    fn session() -> Session {
        Session::new(ViewerState::new(RegionSet::empty(), true), RasterSurface::new())
    }

    fn fake_pages(sizes: &[(u32, u32)]) -> Vec<PageDescriptor> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| FakePage::rgba(i, w, h).into_descriptor())
            .collect()
    }

    #[test]
    fn each_page_renders_at_its_own_size() {
        let sizes = [(30, 20), (12, 40), (7, 7)];
        let mut session = session();
        session.load_with(|| Ok(fake_pages(&sizes)));

        for (i, &size) in sizes.iter().enumerate() {
            session.apply_blocking(Command::GoToPage(i));
            assert_eq!(session.state().navigation().current(), i);
            assert_eq!(session.surface().dimensions(), size);
        }
    }

    #[test]
    fn tiff_buffer_loads_first_page() {
        let buffer = SourceBuffer::from(tiff_container(&[(16, 8), (4, 4)]));
        let mut session = session();
        session.load_buffer(&TiffDecoder, &buffer);

        assert_eq!(session.pages().len(), 2);
        assert_eq!(session.surface().dimensions(), (16, 8));
        assert!(session.state().status().is_some());
    }

    #[test]
    fn failed_render_keeps_last_frame() {
        let mut session = session();
        session.load_with(|| {
            Ok(vec![
                FakePage::rgba(0, 10, 10).into_descriptor(),
                FakePage::failing(1).into_descriptor(),
            ])
        });
        session.apply_blocking(Command::Control(Control::NextPage));

        assert_eq!(session.surface().dimensions(), (10, 10));
        assert!(session.state().error().is_some());
        assert!(!session.state().is_loading());
        assert!(session.state().controls().previous);
    }

    #[test]
    fn empty_buffer_reports_error() {
        let mut session = session();
        session.load_buffer(&TiffDecoder, &SourceBuffer::from(Vec::new()));
        assert!(session.state().error().is_some());
        assert!(!session.state().is_loading());
        assert!(session.pages().is_empty());
    }

    #[test]
    fn superseded_render_result_is_not_committed() {
        let mut session = session();
        session.load_with(|| Ok(fake_pages(&[(10, 10), (20, 20), (30, 30)])));

        let first = session.dispatch(Command::GoToPage(1));
        let second = session.dispatch(Command::GoToPage(2));
        let (Job::Render { ticket: old, .. }, Job::Render { ticket: new, .. }) =
            (&first[0], &second[0])
        else {
            panic!("expected render jobs");
        };

        let frame = |w: u32| {
            Arc::new(PreparedFrame {
                page: 0,
                width: w,
                height: w,
                rgba: vec![0; (w * w * 4) as usize],
            })
        };
        session.finish_render(*old, Ok(frame(20)), Duration::ZERO);
        assert_eq!(session.surface().dimensions(), (10, 10));

        session.finish_render(*new, Ok(frame(30)), Duration::ZERO);
        assert_eq!(session.surface().dimensions(), (30, 30));

        let bogus = RenderTicket {
            id: RequestId::new(999),
            generation: 1,
            page: 0,
            total: 3,
        };
        session.finish_render(bogus, Ok(frame(5)), Duration::ZERO);
        assert_eq!(session.surface().dimensions(), (30, 30));
    }

    #[test]
    fn render_time_excludes_time_spent_queued() {
        let mut session = session();
        session.load_with(|| Ok(fake_pages(&[(10, 10), (8, 8)])));

        let jobs = session.dispatch(Command::GoToPage(1));
        let [Job::Render { ticket, .. }] = jobs.as_slice() else {
            panic!("expected one render job");
        };
        std::thread::sleep(Duration::from_millis(150));
        let frame = Arc::new(PreparedFrame {
            page: 1,
            width: 8,
            height: 8,
            rgba: vec![0; 8 * 8 * 4],
        });
        session.finish_render(*ticket, Ok(frame), Duration::from_millis(7));

        let status = session.state().status().unwrap();
        let millis: u64 = status
            .trim_start_matches("Page 2/2 | Render time: ")
            .trim_end_matches("ms")
            .parse()
            .unwrap();
        assert!((7..100).contains(&millis), "{status}");
    }

    #[test]
    fn loupe_follows_pointer_and_hides() {
        let mut session = session();
        session.load_with(|| Ok(fake_pages(&[(120, 120)])));

        let sample = PointerSample {
            pointer: ScreenPoint::new(60.0, 60.0),
            page_origin: ScreenPoint::default(),
            scroll: ScreenPoint::default(),
            viewport: (400.0, 400.0),
        };
        session.apply_blocking(Command::PointerEntered);
        session.apply_blocking(Command::PointerMoved(sample));
        assert_eq!(session.loupe().dimensions(), (200, 200));

        session.apply_blocking(Command::PointerLeft);
        assert!(session.loupe().is_empty());
    }
}
