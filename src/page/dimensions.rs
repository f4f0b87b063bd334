//! Page dimension resolution
//!
//! Pages do not always declare their size the same way. The resolver walks
//! an ordered list of [`DimensionSource`]s per axis and keeps the first
//! usable (positive) value.

use super::decoder::{DecodedPage, MetadataTag};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Width,
    Height,
}

/// One place a page's width and height may be read from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DimensionSource {
    /// Size the page declared after per-page decode
    Declared,
    /// Metadata fields, scalar or first element of a list
    Fields { width: MetadataTag, height: MetadataTag },
}

impl DimensionSource {
    fn read(self, page: &DecodedPage, axis: Axis) -> Option<i64> {
        match (self, axis) {
            (Self::Declared, Axis::Width) => page.declared.width,
            (Self::Declared, Axis::Height) => page.declared.height,
            (Self::Fields { width, .. }, Axis::Width) => page.fields.get(width)?.first(),
            (Self::Fields { height, .. }, Axis::Height) => page.fields.get(height)?.first(),
        }
    }
}

/// Declared size first, then the `ImageWidth` / `ImageLength` tags
pub const DEFAULT_DIMENSION_SOURCES: [DimensionSource; 2] = [
    DimensionSource::Declared,
    DimensionSource::Fields {
        width: MetadataTag::ImageWidth,
        height: MetadataTag::ImageLength,
    },
];

/// Outcome of walking the sources
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedSize {
    /// Best value found for the width (may be non-positive or missing)
    pub width: Option<i64>,
    /// Best value found for the height (may be non-positive or missing)
    pub height: Option<i64>,
}

impl ResolvedSize {
    /// Both axes as pixel counts, if both are positive and representable
    #[must_use]
    pub fn pixels(&self) -> Option<(u32, u32)> {
        let axis = |v: Option<i64>| v.filter(|&v| v > 0).and_then(|v| u32::try_from(v).ok());
        Some((axis(self.width)?, axis(self.height)?))
    }
}

/// Ordered dimension lookup
#[derive(Clone, Debug)]
pub struct DimensionResolver {
    sources: Vec<DimensionSource>,
}

impl Default for DimensionResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION_SOURCES.to_vec())
    }
}

impl DimensionResolver {
    #[must_use]
    pub fn new(sources: Vec<DimensionSource>) -> Self {
        Self { sources }
    }

    #[must_use]
    pub fn resolve(&self, page: &DecodedPage) -> ResolvedSize {
        ResolvedSize {
            width: self.resolve_axis(page, Axis::Width),
            height: self.resolve_axis(page, Axis::Height),
        }
    }

    /// First positive value; otherwise the first value seen at all
    fn resolve_axis(&self, page: &DecodedPage, axis: Axis) -> Option<i64> {
        let mut fallback = None;
        for source in &self.sources {
            match source.read(page, axis) {
                Some(v) if v > 0 => return Some(v),
                Some(v) => {
                    fallback.get_or_insert(v);
                }
                None => {}
            }
        }
        fallback
    }
}
