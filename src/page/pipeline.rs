//! Page render pipeline
//!
//! Rendering is split in two halves so the expensive part can run off the
//! UI thread:
//!
//! - [`RenderPipeline::prepare`]: per-page decode, dimension resolution,
//!   RGBA expansion and validation. Touches no surface.
//! - [`RenderPipeline::commit`]: resize + blit into the target surface as a
//!   single replace.
//!
//! [`RenderPipeline::render`] runs both and measures the elapsed time.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::decoder::PageDescriptor;
use super::dimensions::DimensionResolver;
use super::error::RenderError;
use crate::surface::Surface;

/// Validated RGBA8 pixels of one page, ready to blit
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedFrame {
    pub page: usize,
    pub width: u32,
    pub height: u32,
    /// Exactly `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl fmt::Debug for PreparedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedFrame")
            .field("page", &self.page)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgba_len", &self.rgba.len())
            .finish()
    }
}

/// A frame that made it onto the surface
#[derive(Clone, Debug)]
pub struct RenderResult {
    pub frame: Arc<PreparedFrame>,
    pub elapsed: Duration,
}

impl RenderResult {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.frame.height
    }

    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.frame.rgba
    }
}

/// Outcome of a full render, successful or not; timing is always present
#[derive(Debug)]
pub struct RenderReport {
    pub page: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub outcome: Result<RenderResult, RenderError>,
}

impl RenderReport {
    #[must_use]
    pub fn status_line(&self) -> String {
        render_status(self.page, self.total, self.elapsed)
    }
}

/// `"Page 2/5 | Render time: 14ms"`
#[must_use]
pub fn render_status(page: usize, total: usize, elapsed: Duration) -> String {
    format!(
        "Page {}/{} | Render time: {}ms",
        page + 1,
        total,
        elapsed.as_millis()
    )
}

/// Turns page descriptors into pixels on a surface
#[derive(Clone, Debug, Default)]
pub struct RenderPipeline {
    resolver: DimensionResolver,
}

impl RenderPipeline {
    #[must_use]
    pub fn new(resolver: DimensionResolver) -> Self {
        Self { resolver }
    }

    /// Decode, size and expand a page without touching any surface
    pub fn prepare(&self, descriptor: &PageDescriptor) -> Result<PreparedFrame, RenderError> {
        let page = descriptor.index();
        let decoded = descriptor
            .decode_image()
            .map_err(|source| RenderError::Decode { page, source })?;

        let resolved = self.resolver.resolve(&decoded);
        let Some((width, height)) = resolved.pixels() else {
            return Err(RenderError::InvalidDimensions {
                page,
                width: resolved.width,
                height: resolved.height,
            });
        };

        let mut rgba = decoded.raster.to_rgba8();
        let expected = width as usize * height as usize * 4;
        if rgba.len() < expected {
            return Err(RenderError::InvalidPixelData {
                page,
                expected,
                actual: rgba.len(),
            });
        }
        if rgba.len() > expected {
            warn!(
                "Page {page}: dropping {} trailing pixel bytes",
                rgba.len() - expected
            );
            rgba.truncate(expected);
        }

        debug!("Prepared page {page}: {width}x{height}");
        Ok(PreparedFrame {
            page,
            width,
            height,
            rgba,
        })
    }

    /// Resize the surface to the frame and replace its pixels
    pub fn commit<S: Surface + ?Sized>(
        frame: &PreparedFrame,
        surface: &mut S,
    ) -> Result<(), RenderError> {
        surface
            .replace_image(frame.width, frame.height, &frame.rgba)
            .map_err(|source| RenderError::Surface {
                page: frame.page,
                source,
            })
    }

    /// Prepare and commit in one go, timing the whole sequence
    pub fn render<S: Surface + ?Sized>(
        &self,
        descriptor: &PageDescriptor,
        total: usize,
        surface: &mut S,
    ) -> RenderReport {
        let started = Instant::now();
        let outcome = self.prepare(descriptor).and_then(|frame| {
            Self::commit(&frame, surface)?;
            Ok(Arc::new(frame))
        });
        let elapsed = started.elapsed();

        let report = RenderReport {
            page: descriptor.index(),
            total,
            elapsed,
            outcome: outcome.map(|frame| RenderResult { frame, elapsed }),
        };
        match &report.outcome {
            Ok(_) => info!("{}", report.status_line()),
            Err(e) => warn!("{} | failed: {e}", report.status_line()),
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::decoder::{DeclaredSize, FieldValue, MetadataTag, PageFields, Raster};
    use crate::surface::RasterSurface;
    use crate::test_utils::fixtures::{FakePage, rgba_gradient};

    #[test]
    fn render_resizes_surface_to_page() {
        let descriptor = FakePage::rgba(0, 6, 4).into_descriptor();
        let mut surface = RasterSurface::new();

        let report = RenderPipeline::default().render(&descriptor, 1, &mut surface);
        let result = report.outcome.unwrap();

        assert_eq!((result.width(), result.height()), (6, 4));
        assert_eq!(result.rgba().len(), 6 * 4 * 4);
        assert_eq!(surface.dimensions(), (6, 4));
        assert_eq!(surface.image().as_raw(), &rgba_gradient(6, 4));
    }

    #[test]
    fn short_pixel_data_keeps_previous_surface() {
        let mut surface = RasterSurface::new();
        let pipeline = RenderPipeline::default();
        pipeline
            .render(&FakePage::rgba(0, 3, 3).into_descriptor(), 2, &mut surface)
            .outcome
            .unwrap();

        let short = FakePage::new(
            1,
            DeclaredSize::new(10, 10),
            PageFields::default(),
            Raster::Rgba8(vec![0; 10 * 10 * 4 - 1]),
        )
        .into_descriptor();
        let report = pipeline.render(&short, 2, &mut surface);

        assert!(matches!(
            report.outcome,
            Err(RenderError::InvalidPixelData {
                page: 1,
                expected: 400,
                actual: 399
            })
        ));
        assert_eq!(surface.dimensions(), (3, 3));
        assert!(report.status_line().starts_with("Page 2/2 | Render time: "));
    }

    #[test]
    fn missing_dimensions_are_invalid() {
        let page = FakePage::new(
            0,
            DeclaredSize::default(),
            PageFields::default().with(MetadataTag::ImageWidth, FieldValue::Scalar(4)),
            Raster::Rgba8(vec![0; 64]),
        )
        .into_descriptor();

        let err = RenderPipeline::default().prepare(&page).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidDimensions {
                width: Some(4),
                height: None,
                ..
            }
        ));
    }

    #[test]
    fn dimensions_from_fields_when_not_declared() {
        let page = FakePage::new(
            0,
            DeclaredSize::default(),
            PageFields::default()
                .with(MetadataTag::ImageWidth, FieldValue::List(vec![2]))
                .with(MetadataTag::ImageLength, FieldValue::Scalar(2)),
            Raster::Gray8(vec![1, 2, 3, 4]),
        )
        .into_descriptor();

        let frame = RenderPipeline::default().prepare(&page).unwrap();
        assert_eq!((frame.width, frame.height), (2, 2));
        assert_eq!(&frame.rgba[..4], &[1, 1, 1, 255]);
    }

    #[test]
    fn decode_failure_is_reported_with_page() {
        let page = FakePage::failing(3).into_descriptor();
        let err = RenderPipeline::default().prepare(&page).unwrap_err();
        assert!(matches!(err, RenderError::Decode { page: 3, .. }));
    }

    #[test]
    fn status_line_format() {
        assert_eq!(
            render_status(0, 2, Duration::from_millis(42)),
            "Page 1/2 | Render time: 42ms"
        );
    }
}
