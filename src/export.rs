//! Headless rendering for the `info`, `export` and `loupe` commands

use image::{Rgba, RgbaImage};

use crate::geometry::PixelRect;
use crate::magnifier::{render_loupe, source_region};
use crate::page::{PageDescriptor, RenderPipeline};
use crate::regions::RegionSet;
use crate::surface::{RasterSurface, Surface};
use crate::viewer::{ViewTransform, Zoom};

const OUTLINE_COLOR: Rgba<u8> = Rgba([0x66, 0x99, 0xCC, 220]);
const OUTLINE_WIDTH: u32 = 2;

/// What `info` prints for one page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSummary {
    pub page: usize,
    pub size: Result<(u32, u32), String>,
}

/// Decode every page and report its size or the reason it cannot be shown
pub fn summarize_pages(pipeline: &RenderPipeline, pages: &[PageDescriptor]) -> Vec<PageSummary> {
    pages
        .iter()
        .map(|descriptor| PageSummary {
            page: descriptor.index(),
            size: pipeline
                .prepare(descriptor)
                .map(|frame| (frame.width, frame.height))
                .map_err(|e| e.to_string()),
        })
        .collect()
}

/// The surface as shown at `zoom`, optionally with region outlines
#[must_use]
pub fn zoomed_image(surface: &RasterSurface, zoom: f32, regions: Option<&RegionSet>) -> RgbaImage {
    let (width, height) = surface.dimensions();
    let transform = ViewTransform::new(Zoom::with_factor(zoom).factor(), width, height);
    let (display_w, display_h) = transform.display_size();
    let (display_w, display_h) = (display_w.round() as u32, display_h.round() as u32);

    let mut out = RasterSurface::with_size(display_w, display_h);
    out.draw_scaled(surface.image(), PixelRect::new(0, 0, display_w, display_h));

    for region in regions.into_iter().flat_map(RegionSet::iter) {
        let rect = transform.rect_to_screen(region.bounds());
        let (x, y) = (rect.x.round() as u32, rect.y.round() as u32);
        let (w, h) = (rect.width.round() as u32, rect.height.round() as u32);
        let (right, bottom) = (x.saturating_add(w), y.saturating_add(h));
        let edges = [
            PixelRect::new(x, y, w, OUTLINE_WIDTH),
            PixelRect::new(x, bottom.saturating_sub(OUTLINE_WIDTH), w, OUTLINE_WIDTH),
            PixelRect::new(x, y, OUTLINE_WIDTH, h),
            PixelRect::new(right.saturating_sub(OUTLINE_WIDTH), y, OUTLINE_WIDTH, h),
        ];
        for edge in edges {
            out.blend_rect(edge, OUTLINE_COLOR);
        }
    }
    out.image().clone()
}

/// Loupe content for a page position, `None` for an empty surface
#[must_use]
pub fn loupe_image(surface: &RasterSurface, x: f32, y: f32) -> Option<RgbaImage> {
    let (width, height) = surface.dimensions();
    if surface.is_empty() {
        return None;
    }
    let mut loupe = RasterSurface::new();
    render_loupe(surface, source_region(x, y, width, height), &mut loupe).then(|| loupe.image().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelPoint;
    use crate::regions::{RegionAction, RegionOfInterest};
    use crate::test_utils::fixtures::FakePage;

    fn white(width: u32, height: u32) -> RasterSurface {
        let mut surface = RasterSurface::new();
        surface
            .replace_image(width, height, &[255; 4].repeat((width * height) as usize))
            .unwrap();
        surface
    }

    #[test]
    fn summaries_report_sizes_and_failures() {
        let pages = vec![
            FakePage::rgba(0, 5, 7).into_descriptor(),
            FakePage::failing(1).into_descriptor(),
        ];
        let summaries = summarize_pages(&RenderPipeline::default(), &pages);
        assert_eq!(summaries[0].size, Ok((5, 7)));
        assert!(summaries[1].size.is_err());
    }

    #[test]
    fn zoomed_image_scales_and_outlines() {
        let regions = RegionSet::new(vec![RegionOfInterest::new(
            "a",
            PixelPoint::new(10, 10),
            PixelPoint::new(20, 20),
            RegionAction::FocusField("a".into()),
        )])
        .unwrap();
        let image = zoomed_image(&white(40, 30), 1.5, Some(&regions));

        assert_eq!(image.dimensions(), (60, 45));
        assert_ne!(*image.get_pixel(15, 20), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(22, 22), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn far_away_regions_are_ignored() {
        let regions = RegionSet::new(vec![RegionOfInterest::new(
            "far",
            PixelPoint::new(u32::MAX - 10, u32::MAX - 10),
            PixelPoint::new(u32::MAX, u32::MAX),
            RegionAction::FocusField("far".into()),
        )])
        .unwrap();
        let image = zoomed_image(&white(10, 10), 2.0, Some(&regions));

        assert_eq!(image.dimensions(), (20, 20));
        assert!(image.pixels().all(|px| *px == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn zoom_is_clamped() {
        assert_eq!(zoomed_image(&white(4, 4), 100.0, None).dimensions(), (20, 20));
    }

    #[test]
    fn loupe_image_is_two_hundred_square() {
        let image = loupe_image(&white(80, 60), 79.0, 0.0).unwrap();
        assert_eq!(image.dimensions(), (200, 200));
        assert!(loupe_image(&RasterSurface::new(), 0.0, 0.0).is_none());
    }
}
