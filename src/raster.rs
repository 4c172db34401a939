//! Drawing rendered glyph text into an RGBA bitmap.
//!
//! Used when a consumer wants pixels instead of text, e.g. to save a
//! capture. Glyphs are placed on the planned grid exactly as a text view
//! with the plan's font size and line height would place them.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::ascii::FontMetrics;
use crate::engine::RenderOutput;

/// Coverage mask of one rasterized glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    /// Horizontal offset of the mask from the pen position
    pub xmin: i32,
    /// Offset of the mask's bottom edge above the baseline
    pub ymin: i32,
    /// Row-major coverage, 0-255
    pub coverage: Vec<u8>,
}

/// Produces glyph coverage masks.
pub trait GlyphRasterizer {
    /// Distance from the top of a line to its baseline.
    fn ascent(&self, font_size_px: f32) -> f32;

    fn rasterize(&self, glyph: char, font_size_px: f32) -> GlyphBitmap;
}

impl GlyphRasterizer for FontMetrics {
    fn ascent(&self, font_size_px: f32) -> f32 {
        FontMetrics::ascent(self, font_size_px)
    }

    fn rasterize(&self, glyph: char, font_size_px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font().rasterize(glyph, font_size_px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            coverage,
        }
    }
}

/// Colors for bitmap output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterStyle {
    pub foreground: Rgba<u8>,
    pub background: Rgba<u8>,
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self {
            foreground: Rgba([255, 255, 255, 255]),
            background: Rgba([0, 0, 0, 255]),
        }
    }
}

/// Errors that can occur when drawing text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    #[error("text has {actual} lines, grid has {expected} rows")]
    RowCount { expected: usize, actual: usize },

    #[error("line {line} has {actual} glyphs, grid has {expected} columns")]
    ColumnCount {
        line: usize,
        expected: usize,
        actual: usize,
    },
}

/// Draw `output` into a new image of `columns * glyph_width` by
/// `rows * line_height` pixels.
pub fn render_bitmap<R: GlyphRasterizer>(
    output: &RenderOutput,
    rasterizer: &R,
    style: &RasterStyle,
) -> Result<RgbaImage, RasterError> {
    let grid = &output.grid;
    let lines: Vec<&str> = output.text.split('\n').collect();
    if lines.len() != grid.rows as usize {
        return Err(RasterError::RowCount {
            expected: grid.rows as usize,
            actual: lines.len(),
        });
    }
    for (i, line) in lines.iter().enumerate() {
        let count = line.chars().count();
        if count != grid.columns as usize {
            return Err(RasterError::ColumnCount {
                line: i,
                expected: grid.columns as usize,
                actual: count,
            });
        }
    }

    let width = ((grid.columns as f32 * grid.glyph_width_px).round() as u32).max(1);
    let height = ((grid.rows as f32 * grid.line_height_px).round() as u32).max(1);
    let mut img = RgbaImage::from_pixel(width, height, style.background);

    let font_px = grid.font_size_px;
    let ascent = rasterizer.ascent(font_px);
    let mut cache: HashMap<char, GlyphBitmap> = HashMap::new();

    for (row, line) in lines.iter().enumerate() {
        let baseline = row as f32 * grid.line_height_px + ascent;
        for (col, glyph) in line.chars().enumerate() {
            if glyph == ' ' {
                continue;
            }
            let bitmap = cache
                .entry(glyph)
                .or_insert_with(|| rasterizer.rasterize(glyph, font_px));
            let x = (col as f32 * grid.glyph_width_px).round() as i32 + bitmap.xmin;
            let y = baseline.round() as i32 - bitmap.ymin - bitmap.height as i32;
            blend_glyph(&mut img, x, y, bitmap, style.foreground);
        }
    }

    Ok(img)
}

fn blend_glyph(img: &mut RgbaImage, x: i32, y: i32, glyph: &GlyphBitmap, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    for row in 0..glyph.height {
        let py = y + row as i32;
        if py < 0 || py >= h as i32 {
            continue;
        }
        for col in 0..glyph.width {
            let px = x + col as i32;
            if px < 0 || px >= w as i32 {
                continue;
            }
            let mask = glyph.coverage[row * glyph.width + col];
            if mask == 0 {
                continue;
            }
            let alpha = (u16::from(mask) * u16::from(color[3])) / 255;
            let inv = 255 - alpha;
            let dst = img.get_pixel_mut(px as u32, py as u32);
            for c in 0..3 {
                let mixed = u16::from(color[c]) * alpha + u16::from(dst[c]) * inv;
                dst[c] = ((mixed + 127) / 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::GridPlan;

    /// Every non-space glyph is a solid 4x8 block sitting on the baseline.
    struct BlockGlyphs;

    impl GlyphRasterizer for BlockGlyphs {
        fn ascent(&self, _font_size_px: f32) -> f32 {
            8.0
        }

        fn rasterize(&self, _glyph: char, _font_size_px: f32) -> GlyphBitmap {
            GlyphBitmap {
                width: 4,
                height: 8,
                xmin: 0,
                ymin: 0,
                coverage: vec![255; 32],
            }
        }
    }

    fn output(text: &str, columns: u32, rows: u32) -> RenderOutput {
        RenderOutput {
            text: text.to_string(),
            grid: GridPlan {
                columns,
                rows,
                font_size_px: 8.0,
                glyph_width_px: 4.0,
                line_height_px: 10.0,
                was_clamped: false,
            },
        }
    }

    #[test]
    fn test_image_size_follows_grid() {
        let style = RasterStyle::default();
        let img = render_bitmap(&output("ab\ncd", 2, 2), &BlockGlyphs, &style).unwrap();
        assert_eq!(img.dimensions(), (8, 20));
    }

    #[test]
    fn test_glyphs_land_in_their_cells() {
        let style = RasterStyle::default();
        let img = render_bitmap(&output("# \n #", 2, 2), &BlockGlyphs, &style).unwrap();
        let white = Rgba([255, 255, 255, 255]);
        let black = Rgba([0, 0, 0, 255]);
        // Row 0: glyph in column 0 only
        assert_eq!(*img.get_pixel(1, 4), white);
        assert_eq!(*img.get_pixel(5, 4), black);
        // Row 1 (y 10..20, baseline at 18): glyph in column 1 only
        assert_eq!(*img.get_pixel(1, 14), black);
        assert_eq!(*img.get_pixel(5, 14), white);
    }

    #[test]
    fn test_rejects_misshapen_text() {
        let style = RasterStyle::default();
        let err = render_bitmap(&output("abc\nde", 3, 2), &BlockGlyphs, &style).unwrap_err();
        assert_eq!(
            err,
            RasterError::ColumnCount {
                line: 1,
                expected: 3,
                actual: 2
            }
        );

        let err = render_bitmap(&output("abc", 3, 2), &BlockGlyphs, &style).unwrap_err();
        assert_eq!(err, RasterError::RowCount { expected: 2, actual: 1 });
    }
}
