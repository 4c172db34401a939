//! Area-average sampling of a grayscale image onto a character grid.
//!
//! A summed-area table is built once per frame; every cell mean is then four
//! table lookups, independent of how many pixels the cell covers.

use super::grayscale::to_grayscale;
use crate::frame::SourceImage;

/// Summed-area table of a grayscale image.
///
/// Entry `(x, y)` holds the sum of all pixels above and to the left of
/// `(x, y)`, so the table is `(width + 1) x (height + 1)` with a zero
/// first row and column.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    sums: Vec<u64>,
    width: u32,
    height: u32,
}

impl IntegralImage {
    /// Build the table in one pass over `gray` (row-major, `width * height`).
    pub fn new(gray: &[u8], width: u32, height: u32) -> Self {
        let w = width as usize;
        let h = height as usize;
        let stride = w + 1;
        let mut sums = vec![0u64; stride * (h + 1)];

        for y in 1..=h {
            let mut row = 0u64;
            let src = &gray[(y - 1) * w..y * w];
            for x in 1..=w {
                row += src[x - 1] as u64;
                sums[y * stride + x] = sums[(y - 1) * stride + x] + row;
            }
        }

        Self { sums, width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sum of the half-open rectangle `[x0, x1) x [y0, y1)`.
    #[inline]
    pub fn rect_sum(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u64 {
        let stride = self.width as usize + 1;
        let at = |x: u32, y: u32| self.sums[y as usize * stride + x as usize];
        at(x1, y1) + at(x0, y0) - at(x1, y0) - at(x0, y1)
    }

    /// Mean of the half-open rectangle, 0 for an empty one.
    #[inline]
    pub fn rect_mean(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u8 {
        let area = (x1.saturating_sub(x0) as u64) * (y1.saturating_sub(y0) as u64);
        if area == 0 {
            return 0;
        }
        (self.rect_sum(x0, y0, x1, y1) / area).min(255) as u8
    }

    /// Pixel span `[start, end)` covered by cell `index` of `count` along an
    /// axis of `extent` pixels.
    ///
    /// Spans differ in size by at most one pixel. When the grid is finer
    /// than the image the span is widened to one pixel so every cell samples
    /// real data.
    #[inline]
    fn cell_span(index: u32, count: u32, extent: u32) -> (u32, u32) {
        let start = (index as u64 * extent as u64 / count as u64) as u32;
        let end = ((index as u64 + 1) * extent as u64 / count as u64) as u32;
        (start, end.max(start + 1).min(extent))
    }

    /// Mean luminance of every cell of a `columns x rows` grid, row-major.
    pub fn sample(&self, columns: u32, rows: u32) -> Vec<u8> {
        let mut out = Vec::new();
        self.sample_into(columns, rows, &mut out);
        out
    }

    /// Mean luminance of every cell, reusing an existing buffer.
    ///
    /// # Returns
    /// The number of cells written to the buffer.
    pub fn sample_into(&self, columns: u32, rows: u32, buffer: &mut Vec<u8>) -> usize {
        buffer.clear();
        if columns == 0 || rows == 0 || self.width == 0 || self.height == 0 {
            return 0;
        }

        let cell_count = columns as usize * rows as usize;
        buffer.reserve(cell_count);

        for r in 0..rows {
            let (y0, y1) = Self::cell_span(r, rows, self.height);
            for c in 0..columns {
                let (x0, x1) = Self::cell_span(c, columns, self.width);
                buffer.push(self.rect_mean(x0, y0, x1, y1));
            }
        }

        cell_count
    }
}

/// Convert `image` to grayscale and compute one mean luminance per cell.
pub fn sample(image: &SourceImage, columns: u32, rows: u32) -> Vec<u8> {
    let gray = to_grayscale(image);
    IntegralImage::new(&gray, image.width(), image.height()).sample(columns, rows)
}
