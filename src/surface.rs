//! Raster drawing surface
//!
//! The [`Surface`] trait is the boundary between the render pipeline /
//! magnifier and whatever actually shows pixels. [`RasterSurface`] keeps the
//! pixels in an [`RgbaImage`]; the terminal canvas widget reads from it.

use image::{Rgba, RgbaImage, imageops};

use crate::geometry::PixelRect;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("pixel buffer holds {actual} bytes, {width}x{height} needs {expected}")]
    BufferTooSmall {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("cannot size a surface to {width}x{height}")]
    Unrepresentable { width: u32, height: u32 },
}

/// A resizable RGBA raster target
pub trait Surface {
    /// Current width and height in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Resize to `width` x `height` and replace every pixel in one step.
    ///
    /// On error the surface is left exactly as it was.
    fn replace_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), SurfaceError>;

    /// Copy a region out of the surface; `None` if it is not fully inside
    fn copy_region(&self, rect: PixelRect) -> Option<RgbaImage>;

    /// Draw `image` stretched into `dest` with nearest-neighbour sampling
    fn draw_scaled(&mut self, image: &RgbaImage, dest: PixelRect);

    /// Alpha-blend a solid color over `rect` (clipped to the surface)
    fn blend_rect(&mut self, rect: PixelRect, color: Rgba<u8>);
}

/// In-memory surface backed by an [`RgbaImage`]
#[derive(Clone, Debug)]
pub struct RasterSurface {
    image: RgbaImage,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface {
    /// Empty 0x0 surface
    #[must_use]
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    /// Transparent surface of the given size
    #[must_use]
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Pixel at (x, y), `None` outside the surface
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.image.width() && y < self.image.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Reset every pixel to transparent, keeping the size
    pub fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }
}

impl Surface for RasterSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn replace_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), SurfaceError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(SurfaceError::Unrepresentable { width, height })?;
        if rgba.len() < expected {
            return Err(SurfaceError::BufferTooSmall {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }

        let image = RgbaImage::from_raw(width, height, rgba[..expected].to_vec())
            .ok_or(SurfaceError::Unrepresentable { width, height })?;
        self.image = image;
        Ok(())
    }

    fn copy_region(&self, rect: PixelRect) -> Option<RgbaImage> {
        let (width, height) = self.dimensions();
        if rect.is_empty() || !rect.fits_within(width, height) {
            return None;
        }
        Some(imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height).to_image())
    }

    fn draw_scaled(&mut self, image: &RgbaImage, dest: PixelRect) {
        if dest.is_empty() || image.width() == 0 || image.height() == 0 {
            return;
        }
        let (width, height) = self.dimensions();
        let x_end = dest.right().min(width);
        let y_end = dest.bottom().min(height);

        for dy in dest.y..y_end {
            let sy = u64::from(dy - dest.y) * u64::from(image.height()) / u64::from(dest.height);
            for dx in dest.x..x_end {
                let sx = u64::from(dx - dest.x) * u64::from(image.width()) / u64::from(dest.width);
                let px = *image.get_pixel(sx as u32, sy as u32);
                self.image.put_pixel(dx, dy, px);
            }
        }
    }

    fn blend_rect(&mut self, rect: PixelRect, color: Rgba<u8>) {
        let (width, height) = self.dimensions();
        let x_end = rect.right().min(width);
        let y_end = rect.bottom().min(height);
        let alpha = u16::from(color[3]);

        for y in rect.y..y_end {
            for x in rect.x..x_end {
                let px = self.image.get_pixel_mut(x, y);
                for c in 0..3 {
                    let blended =
                        (u16::from(color[c]) * alpha + u16::from(px[c]) * (255 - alpha)) / 255;
                    px[c] = blended as u8;
                }
                px[3] = px[3].max(color[3]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> Vec<u8> {
        vec![value; (width * height * 4) as usize]
    }

    #[test]
    fn replace_image_resizes_and_copies() {
        let mut surface = RasterSurface::new();
        surface.replace_image(3, 2, &solid(3, 2, 7)).unwrap();
        assert_eq!(surface.dimensions(), (3, 2));
        assert_eq!(surface.pixel(2, 1), Some(Rgba([7, 7, 7, 7])));
    }

    #[test]
    fn replace_image_truncates_longer_buffers() {
        let mut surface = RasterSurface::new();
        let mut data = solid(2, 2, 1);
        data.extend_from_slice(&[9; 8]);
        surface.replace_image(2, 2, &data).unwrap();
        assert_eq!(surface.image().as_raw().len(), 16);
    }

    #[test]
    fn short_buffer_leaves_surface_untouched() {
        let mut surface = RasterSurface::new();
        surface.replace_image(4, 4, &solid(4, 4, 5)).unwrap();

        let err = surface.replace_image(10, 10, &solid(2, 2, 0)).unwrap_err();
        assert!(matches!(err, SurfaceError::BufferTooSmall { expected: 400, .. }));
        assert_eq!(surface.dimensions(), (4, 4));
        assert_eq!(surface.pixel(0, 0), Some(Rgba([5, 5, 5, 5])));
    }

    #[test]
    fn copy_region_rejects_out_of_bounds() {
        let surface = RasterSurface::with_size(10, 10);
        assert!(surface.copy_region(PixelRect::new(5, 5, 5, 5)).is_some());
        assert!(surface.copy_region(PixelRect::new(6, 5, 5, 5)).is_none());
        assert!(surface.copy_region(PixelRect::new(0, 0, 0, 5)).is_none());
    }

    #[test]
    fn draw_scaled_repeats_source_pixels() {
        let mut source = RgbaImage::new(2, 1);
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let mut surface = RasterSurface::with_size(8, 4);
        surface.draw_scaled(&source, PixelRect::new(0, 0, 8, 4));

        assert_eq!(surface.pixel(3, 3), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(surface.pixel(4, 0), Some(Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn blend_rect_is_clipped() {
        let mut surface = RasterSurface::with_size(2, 2);
        surface.blend_rect(PixelRect::new(1, 1, 10, 10), Rgba([255, 255, 255, 255]));
        assert_eq!(surface.pixel(1, 1), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(surface.pixel(0, 0), Some(Rgba([0, 0, 0, 0])));
    }
}
