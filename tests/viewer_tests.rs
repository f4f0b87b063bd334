use std::sync::Arc;
use std::time::Duration;

use pageloupe::fetch::{SourceBuffer, SourceLocation};
use pageloupe::geometry::{PixelPoint, ScreenPoint};
use pageloupe::magnifier::{LOUPE_SIZE, PointerSample};
use pageloupe::page::{RenderResponse, RenderService, ServiceConfig, TiffDecoder};
use pageloupe::regions::{RegionAction, RegionError, RegionOfInterest, RegionSet};
use pageloupe::surface::{RasterSurface, Surface};
use pageloupe::test_utils::fixtures::{FakePage, tiff_container, tiff_file};
use pageloupe::viewer::{Command, Control, Job, Session, ViewerState};

fn pointer_at(x: f32, y: f32) -> PointerSample {
    PointerSample {
        pointer: ScreenPoint::new(x, y),
        page_origin: ScreenPoint::default(),
        scroll: ScreenPoint::default(),
        viewport: (800.0, 600.0),
    }
}

fn region(id: &str, from: (u32, u32), to: (u32, u32)) -> RegionOfInterest {
    RegionOfInterest::new(
        id,
        PixelPoint::new(from.0, from.1),
        PixelPoint::new(to.0, to.1),
        RegionAction::FocusField(id.to_string()),
    )
}

fn two_page_session(regions: RegionSet) -> Session {
    let buffer = SourceBuffer::from(tiff_container(&[(300, 300), (150, 150)]));
    let mut session = Session::new(ViewerState::new(regions, true), RasterSurface::new());
    session.load_buffer(&TiffDecoder, &buffer);
    session
}

#[test]
fn two_page_document_end_to_end() {
    let mut session = two_page_session(RegionSet::empty());

    let state = session.state();
    assert_eq!(state.navigation().total(), 2);
    assert_eq!(state.navigation().current(), 0);
    assert_eq!(session.surface().dimensions(), (300, 300));
    assert!(state.status().is_some_and(|s| s.starts_with("Page 1/2 | Render time:")));
    assert!(!state.controls().previous);
    assert!(state.controls().next);

    session.apply_blocking(Command::Control(Control::NextPage));

    let state = session.state();
    assert_eq!(state.navigation().current(), 1);
    assert_eq!(session.surface().dimensions(), (150, 150));
    assert!(state.controls().previous);
    assert!(!state.controls().next);

    // Disabled control is a no-op
    session.apply_blocking(Command::Control(Control::NextPage));
    assert_eq!(session.state().navigation().current(), 1);
}

#[test]
fn magnifier_hidden_while_disabled() {
    let mut session = two_page_session(RegionSet::empty());

    session.apply_blocking(Command::PointerEntered);
    session.apply_blocking(Command::PointerMoved(pointer_at(120.0, 150.0)));
    assert!(session.state().magnifier().is_visible());
    assert_eq!(session.loupe().dimensions(), (LOUPE_SIZE, LOUPE_SIZE));

    session.apply_blocking(Command::Control(Control::ToggleMagnifier));
    assert!(!session.state().magnifier().is_visible());
    assert!(session.loupe().is_empty());

    session.apply_blocking(Command::PointerMoved(pointer_at(130.0, 150.0)));
    assert!(session.loupe().is_empty());

    session.apply_blocking(Command::Control(Control::ToggleMagnifier));
    assert!(session.state().magnifier().is_visible());
    assert!(!session.loupe().is_empty());
}

#[test]
fn click_focuses_region_through_zoom() {
    let regions = RegionSet::new(vec![
        region("name", (20, 20), (140, 60)),
        region("amount", (20, 100), (280, 160)),
    ])
    .unwrap();
    let mut session = two_page_session(regions);

    session.apply_blocking(Command::Clicked(pointer_at(30.0, 30.0)));
    assert_eq!(session.state().focused_field(), Some("name"));

    session.apply_blocking(Command::Control(Control::ZoomIn));
    session.apply_blocking(Command::Control(Control::ZoomIn));
    // 1.5x: page (100, 120) shows at (150, 180)
    session.apply_blocking(Command::Clicked(pointer_at(150.0, 180.0)));
    assert_eq!(session.state().focused_field(), Some("amount"));

    // Outside every region leaves focus alone
    session.apply_blocking(Command::Clicked(pointer_at(440.0, 440.0)));
    assert_eq!(session.state().focused_field(), Some("amount"));
}

#[test]
fn overlapping_regions_are_rejected() {
    let err = RegionSet::new(vec![
        region("a", (0, 0), (50, 50)),
        region("b", (40, 40), (90, 90)),
    ])
    .unwrap_err();
    assert!(matches!(err, RegionError::Overlap { .. }));

    assert!(
        RegionSet::new(vec![region("a", (0, 0), (50, 50)), region("b", (50, 0), (90, 50))])
            .is_ok()
    );
}

#[test]
fn only_the_latest_render_is_committed() {
    let mut session = Session::new(
        ViewerState::new(RegionSet::empty(), true),
        RasterSurface::new(),
    );
    session.load_with(|| {
        Ok(vec![
            FakePage::rgba(0, 10, 10).into_descriptor(),
            FakePage::rgba(1, 20, 20).into_descriptor(),
            FakePage::rgba(2, 30, 30).into_descriptor(),
        ])
    });

    let first = session.dispatch(Command::GoToPage(1));
    let second = session.dispatch(Command::GoToPage(2));
    assert!(session.state().is_loading());

    // Finish the newest first, then the superseded one
    session.run_jobs(second);
    session.run_jobs(first);

    assert_eq!(session.surface().dimensions(), (30, 30));
    assert_eq!(session.state().navigation().current(), 2);
    assert!(!session.state().is_loading());
}

#[test]
fn background_service_loads_and_renders() {
    let file = tiff_file(&[(64, 32), (16, 16)]);
    let service = RenderService::new(ServiceConfig::default(), Arc::new(TiffDecoder));
    let mut session = Session::new(
        ViewerState::new(RegionSet::empty(), true),
        RasterSurface::new(),
    );

    let mut jobs = session.dispatch(Command::BeginLoad);
    for _ in 0..4 {
        for job in std::mem::take(&mut jobs) {
            match job {
                Job::Load { generation } => service
                    .request_load(generation, SourceLocation::Path(file.path().to_path_buf())),
                Job::Render { ticket, descriptor } => service.request_page(ticket, descriptor),
            }
        }
        let Some(response) = service.wait_response(Duration::from_secs(10)) else {
            break;
        };
        jobs = match response {
            RenderResponse::Loaded { generation, result } => session.finish_load(generation, result),
            RenderResponse::Page {
                ticket,
                result,
                elapsed,
            } => session.finish_render(ticket, result, elapsed),
            RenderResponse::Cancelled(_) => vec![],
        };
        if !session.state().is_loading() {
            break;
        }
    }

    assert_eq!(session.state().navigation().total(), 2);
    assert_eq!(session.surface().dimensions(), (64, 32));
    assert!(session.state().error().is_none());
}

#[test]
fn missing_file_reports_error() {
    let service = RenderService::new(ServiceConfig::default(), Arc::new(TiffDecoder));
    let mut session = Session::new(
        ViewerState::new(RegionSet::empty(), true),
        RasterSurface::new(),
    );
    let generation = session.state().generation() + 1;
    session.dispatch(Command::BeginLoad);
    service.request_load(generation, SourceLocation::parse("/nonexistent/doc.tif"));

    match service.wait_response(Duration::from_secs(10)) {
        Some(RenderResponse::Loaded { generation, result }) => {
            session.finish_load(generation, result);
        }
        other => panic!("unexpected response: {other:?}"),
    }
    assert!(session.state().error().is_some());
    assert!(!session.state().is_loading());
    assert!(!session.state().controls().next);
}
