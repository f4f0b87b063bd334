//! Errors raised while decoding and rendering pages

use crate::fetch::FetchError;
use crate::surface::SurfaceError;

/// Container or per-page decode failure
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("source buffer is empty")]
    Empty,

    #[error("malformed image container: {0}")]
    Malformed(String),

    #[error("image container holds no pages")]
    NoPages,

    #[error("page {page} not found in container")]
    MissingPage { page: usize },

    #[error("unsupported pixel format: {0}")]
    UnsupportedColor(String),
}

impl From<tiff::TiffError> for DecodeError {
    fn from(err: tiff::TiffError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Failure of the page render pipeline
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("page {page}: {source}")]
    Decode {
        page: usize,
        #[source]
        source: DecodeError,
    },

    #[error("page {page}: invalid dimensions {width:?}x{height:?}")]
    InvalidDimensions {
        page: usize,
        width: Option<i64>,
        height: Option<i64>,
    },

    #[error("page {page}: pixel data holds {actual} bytes, expected at least {expected}")]
    InvalidPixelData {
        page: usize,
        expected: usize,
        actual: usize,
    },

    #[error("page {page}: {source}")]
    Surface {
        page: usize,
        #[source]
        source: SurfaceError,
    },
}

/// Failure of the fetch-and-decode sequence
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}
