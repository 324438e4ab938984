//! Region and associated-image pixel readers.
//!
//! OpenSlide fills caller-allocated buffers of packed premultiplied ARGB
//! pixels. The readers here allocate a buffer of exactly the requested
//! size, run the native fill under the error-check policy, and convert the
//! result to a non-premultiplied [`RgbaImage`]. Geometry is validated
//! before any allocation so a hostile width or height can never reach
//! buffer-size arithmetic.

use image::RgbaImage;

use crate::error::OpenSlideError;
use crate::pixel;

use super::handle::{cstring_arg, Slide};

impl Slide {
    /// Read a region of the slide.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Top-left corner of the region, in level-0 coordinates
    /// * `level` - Pyramid level to read from
    /// * `width`, `height` - Region size, in the chosen level's coordinates
    ///
    /// # Errors
    ///
    /// - [`OpenSlideError::NegativeDimensions`] for a negative width or
    ///   height, raised before any allocation
    /// - [`OpenSlideError::RegionTooLarge`] if the pixel count does not
    ///   fit buffer arithmetic
    /// - [`OpenSlideError::Native`] if the library reports a read failure
    ///
    /// A zero width or height short-circuits to an empty image of that
    /// size without invoking the native fill.
    pub fn read_region(
        &self,
        x: i64,
        y: i64,
        level: i32,
        width: i64,
        height: i64,
    ) -> Result<RgbaImage, OpenSlideError> {
        if width < 0 || height < 0 {
            return Err(OpenSlideError::NegativeDimensions { width, height });
        }
        if width == 0 || height == 0 {
            return Ok(RgbaImage::new(width as u32, height as u32));
        }

        let (w, h, mut buf) = alloc_pixel_buffer(width, height)?;
        self.checked(|api, handle| unsafe {
            (api.read_region)(handle, buf.as_mut_ptr(), x, y, level, width, height)
        })?;
        pixel::to_rgba_image(&buf, w, h)
    }

    /// Read the named associated image in full.
    ///
    /// The name is passed straight to the library: an unknown name
    /// surfaces as the library's own error, not a local pre-check.
    ///
    /// # Errors
    ///
    /// As [`Slide::read_region`], plus any error the dimension query
    /// raises.
    pub fn read_associated_image(&self, name: &str) -> Result<RgbaImage, OpenSlideError> {
        let (width, height) = self.associated_image_dimensions(name)?;
        if width < 0 || height < 0 {
            return Err(OpenSlideError::NegativeDimensions { width, height });
        }
        if width == 0 || height == 0 {
            return Ok(RgbaImage::new(width as u32, height as u32));
        }

        let c_name = cstring_arg(name)?;
        let (w, h, mut buf) = alloc_pixel_buffer(width, height)?;
        self.checked(|api, handle| unsafe {
            (api.read_associated_image)(handle, c_name.as_ptr(), buf.as_mut_ptr())
        })?;
        pixel::to_rgba_image(&buf, w, h)
    }
}

/// Allocate a zeroed pixel buffer for a validated, non-empty region.
///
/// Checks that the dimensions fit `u32` (the image crate's coordinate
/// type) and that the pixel count fits `usize` before any allocation
/// happens.
fn alloc_pixel_buffer(width: i64, height: i64) -> Result<(u32, u32, Vec<u32>), OpenSlideError> {
    let too_large = OpenSlideError::RegionTooLarge { width, height };

    let w = u32::try_from(width).map_err(|_| too_large.clone())?;
    let h = u32::try_from(height).map_err(|_| too_large.clone())?;
    let pixels = (w as usize)
        .checked_mul(h as usize)
        .ok_or(too_large)?;

    Ok((w, h, vec![0u32; pixels]))
}
