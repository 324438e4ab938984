//! Conversion of OpenSlide pixel buffers to portable RGBA images.
//!
//! OpenSlide fills caller-allocated buffers with one packed 32-bit value
//! per pixel: channels in alpha-red-green-blue order from the most
//! significant byte down, color channels premultiplied by alpha, the whole
//! word stored in host byte order. Reading each pixel back as a native
//! `u32` and extracting channels by shift yields identical channel values
//! on little- and big-endian hosts, so the byte-order normalization is
//! entirely contained in that reinterpretation and the rest of the crate
//! is endianness-oblivious.

use image::RgbaImage;

use crate::error::OpenSlideError;

/// Convert a packed premultiplied-ARGB buffer into a straight-alpha RGBA
/// image.
///
/// The returned image owns its own storage; the input buffer can be
/// discarded afterwards.
///
/// # Arguments
///
/// * `buf` - One packed native-endian ARGB value per pixel, row-major
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Errors
///
/// Returns [`OpenSlideError::PixelBufferSize`] if `buf` does not hold
/// exactly `width * height` pixels. Zero-size images are the caller's
/// concern: region readers short-circuit before allocating a buffer.
pub fn to_rgba_image(buf: &[u32], width: u32, height: u32) -> Result<RgbaImage, OpenSlideError> {
    let expected = u64::from(width) * u64::from(height);
    if buf.len() as u64 != expected {
        return Err(OpenSlideError::PixelBufferSize {
            expected,
            actual: buf.len() as u64,
        });
    }

    let mut bytes = Vec::with_capacity(buf.len() * 4);
    for &px in buf {
        let a = (px >> 24) as u8;
        let r = unpremultiply((px >> 16) as u8, a);
        let g = unpremultiply((px >> 8) as u8, a);
        let b = unpremultiply(px as u8, a);
        bytes.extend_from_slice(&[r, g, b, a]);
    }

    RgbaImage::from_raw(width, height, bytes).ok_or(OpenSlideError::PixelBufferSize {
        expected,
        actual: buf.len() as u64,
    })
}

/// Undo alpha premultiplication for one color channel.
///
/// Rounds half up, saturating at 255 for inputs where the stored channel
/// exceeds the alpha (not producible by a well-behaved encoder, but the
/// buffer crossed an FFI boundary).
fn unpremultiply(channel: u8, alpha: u8) -> u8 {
    match alpha {
        0 => 0,
        255 => channel,
        a => {
            let v = (u32::from(channel) * 255 + u32::from(a) / 2) / u32::from(a);
            v.min(255) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_red_round_trips() {
        let img = to_rgba_image(&[0xFFFF0000], 1, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_opaque_channels_are_untouched() {
        let img = to_rgba_image(&[0xFF336699], 1, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0x33, 0x66, 0x99, 255]);
    }

    #[test]
    fn test_half_alpha_doubles_channels() {
        // alpha 128, premultiplied channel 64 -> (64 * 255 + 64) / 128 = 128
        let img = to_rgba_image(&[0x80404040], 1, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [128, 128, 128, 128]);
    }

    #[test]
    fn test_unpremultiply_saturates_at_255() {
        // channel 32 with alpha 16 would scale to 510
        assert_eq!(unpremultiply(32, 16), 255);
    }

    #[test]
    fn test_zero_alpha_zeroes_channels() {
        let img = to_rgba_image(&[0x00FF00FF], 1, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_pixels_stay_in_row_major_order() {
        let buf = [0xFF110000, 0xFF002200, 0xFF000033, 0xFF444444];
        let img = to_rgba_image(&buf, 2, 2).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0x11, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0x22, 0, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0x33, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [0x44, 0x44, 0x44, 255]);
    }

    #[test]
    fn test_buffer_size_mismatch_is_rejected() {
        let result = to_rgba_image(&[0u32; 3], 2, 2);
        assert!(matches!(
            result,
            Err(OpenSlideError::PixelBufferSize {
                expected: 4,
                actual: 3,
            })
        ));
    }

    #[test]
    fn test_unpremultiply_rounds_half_up() {
        // channel 100 with alpha 128: (100 * 255 + 64) / 128 = 199.7 -> 199
        assert_eq!(unpremultiply(100, 128), 199);
        // channel 1 with alpha 2: (255 + 1) / 2 = 128
        assert_eq!(unpremultiply(1, 2), 128);
    }
}
