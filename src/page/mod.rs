//! Page decoding and rendering infrastructure

mod cache;
mod decoder;
mod dimensions;
mod error;
mod pipeline;
mod request;
mod service;
mod worker;

pub use cache::{CacheKey, PageCache};
pub use decoder::{
    DeclaredSize, DecodedPage, FieldValue, MetadataTag, PageDecoder, PageDescriptor, PageFields,
    PageImage, Raster, TiffDecoder,
};
pub use dimensions::{DEFAULT_DIMENSION_SOURCES, DimensionResolver, DimensionSource, ResolvedSize};
pub use error::{DecodeError, LoadError, RenderError};
pub use pipeline::{PreparedFrame, RenderPipeline, RenderReport, RenderResult, render_status};
pub use request::{RenderRequest, RenderResponse, RenderTicket, RequestId};
pub use service::{DEFAULT_CACHE_SIZE, RenderService, ServiceConfig};

use log::info;

use crate::fetch::{Fetcher, SourceBuffer, SourceLocation};

/// Split an already fetched buffer into pages
pub fn decode_pages(
    decoder: &dyn PageDecoder,
    source: &SourceBuffer,
) -> Result<Vec<PageDescriptor>, DecodeError> {
    let pages = decoder.decode(source)?;
    if pages.is_empty() {
        return Err(DecodeError::NoPages);
    }
    Ok(pages)
}

/// Fetch a container and split it into pages
pub fn load_pages(
    fetcher: &Fetcher,
    decoder: &dyn PageDecoder,
    source: &SourceLocation,
) -> Result<Vec<PageDescriptor>, LoadError> {
    info!("Loading {source}");
    let buffer = fetcher.fetch(source)?;
    Ok(decode_pages(decoder, &buffer)?)
}
