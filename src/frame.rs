//! Source image types and frame transformation utilities.

use thiserror::Error;

/// Pixel layout of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
    /// RGBA format (4 bytes per pixel, alpha ignored for luminance)
    Rgba,
}

impl PixelFormat {
    /// Get the number of bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Errors that can occur when wrapping a pixel buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("image has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },

    #[error("buffer holds {actual} bytes, expected {expected} for {width}x{height} {format:?}")]
    LengthMismatch {
        width: u32,
        height: u32,
        format: PixelFormat,
        expected: usize,
        actual: usize,
    },
}

/// An in-memory source frame: a camera frame or a decoded photo.
///
/// The buffer length is validated on construction, so every pipeline stage
/// can index it without bounds surprises.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl SourceImage {
    /// Wrap a raw pixel buffer in row-major order.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroArea { width, height });
        }
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                width,
                height,
                format,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Build an RGB image filled with one color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, FrameError> {
        let pixels = width as usize * height as usize;
        let data = rgb.iter().copied().cycle().take(pixels * 3).collect();
        Self::new(data, width, height, PixelFormat::Rgb)
    }

    /// Build a diagonal gray gradient, dark at the top-left corner.
    ///
    /// Useful as a stand-in frame when no camera or photo is available.
    pub fn test_pattern(width: u32, height: u32) -> Result<Self, FrameError> {
        let span = (width as u64 + height as u64).max(1);
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height as u64 {
            for x in 0..width as u64 {
                let gray = ((x + y) * 255 / span) as u8;
                data.extend_from_slice(&[gray, gray, gray]);
            }
        }
        Self::new(data, width, height, PixelFormat::Rgb)
    }

    /// Convert a decoded RGB image.
    pub fn from_rgb_image(img: image::RgbImage) -> Result<Self, FrameError> {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, PixelFormat::Rgb)
    }

    /// Convert a decoded RGBA image.
    pub fn from_rgba_image(img: image::RgbaImage) -> Result<Self, FrameError> {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, PixelFormat::Rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Mirror the frame horizontally (flip left-right) for selfie mode.
    pub fn mirror_horizontal(&mut self) {
        let width = self.width as usize;
        let bpp = self.format.bytes_per_pixel();

        for row in self.data.chunks_exact_mut(width * bpp) {
            for x in 0..width / 2 {
                let left = x * bpp;
                let right = (width - 1 - x) * bpp;
                for i in 0..bpp {
                    row.swap(left + i, right + i);
                }
            }
        }
    }

    /// Downscale with nearest-neighbour sampling so the frame fits inside
    /// `max_width x max_height`, keeping the aspect ratio.
    ///
    /// Frames that already fit are returned unchanged; this never upscales.
    pub fn fit_within(&self, max_width: u32, max_height: u32) -> SourceImage {
        let max_width = max_width.max(1);
        let max_height = max_height.max(1);
        let scale = (max_width as f32 / self.width as f32)
            .min(max_height as f32 / self.height as f32)
            .min(1.0);
        if scale >= 1.0 {
            return self.clone();
        }

        let new_w = ((self.width as f32 * scale) as u32).max(1);
        let new_h = ((self.height as f32 * scale) as u32).max(1);
        let bpp = self.format.bytes_per_pixel();
        let mut data = Vec::with_capacity(new_w as usize * new_h as usize * bpp);

        for y in 0..new_h as u64 {
            let sy = (y * self.height as u64 / new_h as u64) as usize;
            for x in 0..new_w as u64 {
                let sx = (x * self.width as u64 / new_w as u64) as usize;
                let idx = (sy * self.width as usize + sx) * bpp;
                data.extend_from_slice(&self.data[idx..idx + bpp]);
            }
        }

        SourceImage {
            data,
            width: new_w,
            height: new_h,
            format: self.format,
        }
    }
}
