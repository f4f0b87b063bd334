//! Page container decoding
//!
//! [`PageDecoder`] splits a container into [`PageDescriptor`]s without
//! touching pixel data. Each descriptor decodes its own page on demand
//! through the [`PageImage`] it wraps.

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use log::debug;
use tiff::ColorType;
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use super::error::DecodeError;
use crate::fetch::SourceBuffer;

/// Per-page metadata tags consulted for dimensions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetadataTag {
    ImageWidth,
    ImageLength,
}

impl MetadataTag {
    fn tiff_tag(self) -> Tag {
        match self {
            Self::ImageWidth => Tag::ImageWidth,
            Self::ImageLength => Tag::ImageLength,
        }
    }
}

/// A metadata value: either a scalar or a sequence of scalars
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(i64),
    List(Vec<i64>),
}

impl FieldValue {
    /// The scalar, or the first element of a sequence
    #[must_use]
    pub fn first(&self) -> Option<i64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::List(values) => values.first().copied(),
        }
    }
}

/// Metadata fields of a decoded page
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageFields(HashMap<MetadataTag, FieldValue>);

impl PageFields {
    pub fn insert(&mut self, tag: MetadataTag, value: FieldValue) {
        self.0.insert(tag, value);
    }

    #[must_use]
    pub fn get(&self, tag: MetadataTag) -> Option<&FieldValue> {
        self.0.get(&tag)
    }

    #[must_use]
    pub fn with(mut self, tag: MetadataTag, value: FieldValue) -> Self {
        self.insert(tag, value);
        self
    }
}

/// Dimensions a page declares about itself, when it does
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeclaredSize {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl DeclaredSize {
    #[must_use]
    pub const fn new(width: i64, height: i64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }
}

/// Raw samples of a decoded page, in the container's own layout
#[derive(Clone, PartialEq, Eq)]
pub enum Raster {
    Gray8(Vec<u8>),
    GrayAlpha8(Vec<u8>),
    Rgb8(Vec<u8>),
    Rgba8(Vec<u8>),
    Cmyk8(Vec<u8>),
    Gray16(Vec<u16>),
    GrayAlpha16(Vec<u16>),
    Rgb16(Vec<u16>),
    Rgba16(Vec<u16>),
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, len) = match self {
            Self::Gray8(d) => ("Gray8", d.len()),
            Self::GrayAlpha8(d) => ("GrayAlpha8", d.len()),
            Self::Rgb8(d) => ("Rgb8", d.len()),
            Self::Rgba8(d) => ("Rgba8", d.len()),
            Self::Cmyk8(d) => ("Cmyk8", d.len()),
            Self::Gray16(d) => ("Gray16", d.len()),
            Self::GrayAlpha16(d) => ("GrayAlpha16", d.len()),
            Self::Rgb16(d) => ("Rgb16", d.len()),
            Self::Rgba16(d) => ("Rgba16", d.len()),
        };
        write!(f, "{name}({len} samples)")
    }
}

#[inline]
fn narrow(sample: u16) -> u8 {
    (sample >> 8) as u8
}

impl Raster {
    /// Expand to interleaved RGBA8.
    ///
    /// Trailing samples that do not form a whole pixel are dropped; the
    /// caller is responsible for checking the result against the page size.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self {
            Self::Rgba8(data) => data.clone(),
            Self::Gray8(data) => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            Self::GrayAlpha8(data) => data
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            Self::Rgb8(data) => data
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            Self::Cmyk8(data) => data
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = 255 - u16::from(px[3]);
                    let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
                    [channel(px[0]), channel(px[1]), channel(px[2]), 255]
                })
                .collect(),
            Self::Gray16(data) => data
                .iter()
                .flat_map(|&g| {
                    let g = narrow(g);
                    [g, g, g, 255]
                })
                .collect(),
            Self::GrayAlpha16(data) => data
                .chunks_exact(2)
                .flat_map(|px| {
                    let g = narrow(px[0]);
                    [g, g, g, narrow(px[1])]
                })
                .collect(),
            Self::Rgb16(data) => data
                .chunks_exact(3)
                .flat_map(|px| [narrow(px[0]), narrow(px[1]), narrow(px[2]), 255])
                .collect(),
            Self::Rgba16(data) => data.iter().map(|&s| narrow(s)).collect(),
        }
    }

    fn from_tiff(color: ColorType, samples: DecodingResult) -> Result<Self, DecodeError> {
        let raster = match (color, samples) {
            (ColorType::Gray(8), DecodingResult::U8(d)) => Self::Gray8(d),
            (ColorType::GrayA(8), DecodingResult::U8(d)) => Self::GrayAlpha8(d),
            (ColorType::RGB(8), DecodingResult::U8(d)) => Self::Rgb8(d),
            (ColorType::RGBA(8), DecodingResult::U8(d)) => Self::Rgba8(d),
            (ColorType::CMYK(8), DecodingResult::U8(d)) => Self::Cmyk8(d),
            (ColorType::Gray(16), DecodingResult::U16(d)) => Self::Gray16(d),
            (ColorType::GrayA(16), DecodingResult::U16(d)) => Self::GrayAlpha16(d),
            (ColorType::RGB(16), DecodingResult::U16(d)) => Self::Rgb16(d),
            (ColorType::RGBA(16), DecodingResult::U16(d)) => Self::Rgba16(d),
            (color, _) => return Err(DecodeError::UnsupportedColor(format!("{color:?}"))),
        };
        Ok(raster)
    }
}

/// Output of a per-page decode
#[derive(Clone, Debug)]
pub struct DecodedPage {
    pub declared: DeclaredSize,
    pub fields: PageFields,
    pub raster: Raster,
}

/// A page whose pixels can be decoded on demand
pub trait PageImage: Send + Sync {
    fn decode_image(&self) -> Result<DecodedPage, DecodeError>;
}

/// One page of a container: its index plus lazy pixel access
#[derive(Clone)]
pub struct PageDescriptor {
    index: usize,
    image: Arc<dyn PageImage>,
}

impl PageDescriptor {
    #[must_use]
    pub fn new(index: usize, image: Arc<dyn PageImage>) -> Self {
        Self { index, image }
    }

    /// 0-based position in the container
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn decode_image(&self) -> Result<DecodedPage, DecodeError> {
        self.image.decode_image()
    }
}

impl fmt::Debug for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDescriptor")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Splits a container into page descriptors
pub trait PageDecoder: Send + Sync {
    fn decode(&self, source: &SourceBuffer) -> Result<Vec<PageDescriptor>, DecodeError>;
}

/// Multi-page TIFF decoder
#[derive(Clone, Copy, Debug, Default)]
pub struct TiffDecoder;

impl PageDecoder for TiffDecoder {
    fn decode(&self, source: &SourceBuffer) -> Result<Vec<PageDescriptor>, DecodeError> {
        if source.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut decoder = Decoder::new(Cursor::new(&source[..]))?;
        // A successfully opened container always has its first directory
        let mut count = 1;
        while decoder.more_images() {
            decoder.next_image()?;
            count += 1;
        }
        debug!("TIFF container holds {count} page(s)");

        Ok((0..count)
            .map(|index| {
                let page = TiffPage {
                    source: source.clone(),
                    ifd: index,
                };
                PageDescriptor::new(index, Arc::new(page))
            })
            .collect())
    }
}

/// One image file directory inside a TIFF container
struct TiffPage {
    source: SourceBuffer,
    ifd: usize,
}

impl PageImage for TiffPage {
    fn decode_image(&self) -> Result<DecodedPage, DecodeError> {
        let mut decoder = Decoder::new(Cursor::new(&self.source[..]))?;
        for _ in 0..self.ifd {
            if !decoder.more_images() {
                return Err(DecodeError::MissingPage { page: self.ifd });
            }
            decoder.next_image()?;
        }

        let declared = match decoder.dimensions() {
            Ok((width, height)) => DeclaredSize::new(i64::from(width), i64::from(height)),
            Err(e) => {
                debug!("Page {} declares no dimensions: {e}", self.ifd);
                DeclaredSize::default()
            }
        };

        let mut fields = PageFields::default();
        for tag in [MetadataTag::ImageWidth, MetadataTag::ImageLength] {
            if let Some(value) = decoder.find_tag(tag.tiff_tag())?.and_then(field_value) {
                fields.insert(tag, value);
            }
        }

        let color = decoder.colortype()?;
        let samples = decoder.read_image()?;
        let raster = Raster::from_tiff(color, samples)?;

        Ok(DecodedPage {
            declared,
            fields,
            raster,
        })
    }
}

fn field_value(value: Value) -> Option<FieldValue> {
    match value {
        Value::List(items) => {
            let values: Vec<i64> = items.into_iter().filter_map(scalar_value).collect();
            (!values.is_empty()).then_some(FieldValue::List(values))
        }
        other => scalar_value(other).map(FieldValue::Scalar),
    }
}

fn scalar_value(value: Value) -> Option<i64> {
    match value {
        Value::Byte(v) => Some(i64::from(v)),
        Value::Short(v) => Some(i64::from(v)),
        Value::Unsigned(v) => Some(i64::from(v)),
        Value::UnsignedBig(v) => i64::try_from(v).ok(),
        Value::Signed(v) => Some(i64::from(v)),
        Value::SignedBig(v) => Some(v),
        _ => None,
    }
}
