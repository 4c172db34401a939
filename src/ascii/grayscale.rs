//! RGB(A) to grayscale conversion using the ITU-R BT.601 luminance formula.

use crate::frame::SourceImage;

/// Luminance of one pixel: Y = 0.299*R + 0.587*G + 0.114*B.
///
/// Integer math, coefficients scaled by 1000 (299 + 587 + 114 = 1000).
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Convert a source image to grayscale, one value (0-255) per pixel.
///
/// The alpha channel of RGBA images is ignored.
pub fn to_grayscale(image: &SourceImage) -> Vec<u8> {
    let mut gray = Vec::new();
    to_grayscale_into(image, &mut gray);
    gray
}

/// Convert a source image to grayscale, reusing an existing buffer.
///
/// This avoids allocation when called repeatedly (e.g., each frame).
///
/// # Returns
/// The number of pixels written to the buffer
pub fn to_grayscale_into(image: &SourceImage, buffer: &mut Vec<u8>) -> usize {
    let pixel_count = image.pixel_count();
    let bpp = image.format().bytes_per_pixel();
    buffer.clear();
    buffer.reserve(pixel_count);

    for px in image.data().chunks_exact(bpp) {
        buffer.push(luminance(px[0], px[1], px[2]));
    }

    pixel_count
}

/// 256-bin histogram of grayscale values.
pub fn histogram(gray: &[u8]) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in gray {
        hist[v as usize] += 1;
    }
    hist
}
