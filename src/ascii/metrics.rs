//! Glyph measurement for grid planning.
//!
//! The grid planner needs to know how wide each glyph is and how tall a line
//! is at a given font size. [`FontMetrics`] measures a real font through
//! `fontdue`; [`MonospaceMetrics`] is a font-free approximation used when no
//! font file is configured.

use std::path::Path;

use fontdue::{Font, FontSettings};
use thiserror::Error;

/// Measures glyphs at a given font size, in device pixels.
pub trait GlyphMetrics {
    /// Horizontal advance of one glyph.
    fn advance_width(&self, glyph: char, font_size_px: f32) -> f32;

    /// Distance between consecutive baselines.
    fn line_height(&self, font_size_px: f32) -> f32;
}

impl<M: GlyphMetrics + ?Sized> GlyphMetrics for &M {
    fn advance_width(&self, glyph: char, font_size_px: f32) -> f32 {
        (**self).advance_width(glyph, font_size_px)
    }

    fn line_height(&self, font_size_px: f32) -> f32 {
        (**self).line_height(font_size_px)
    }
}

/// Fixed-proportion metrics of a typical monospace font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    /// Advance width as a fraction of the font size
    pub advance_em: f32,
    /// Line height as a fraction of the font size (before rounding up)
    pub line_em: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            advance_em: 0.6,
            line_em: 1.17,
        }
    }
}

impl GlyphMetrics for MonospaceMetrics {
    fn advance_width(&self, _glyph: char, font_size_px: f32) -> f32 {
        font_size_px * self.advance_em
    }

    fn line_height(&self, font_size_px: f32) -> f32 {
        (font_size_px * self.line_em).ceil()
    }
}

/// Errors that can occur when loading a font.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to read font file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse font: {0}")]
    Parse(&'static str),
}

/// Metrics measured from a real font file.
pub struct FontMetrics {
    font: Font,
}

impl FontMetrics {
    /// Parse a TrueType/OpenType font from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(FontError::Parse)?;
        Ok(Self { font })
    }

    /// Load a font file from disk.
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|e| FontError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Distance from the top of a line to its baseline.
    pub fn ascent(&self, font_size_px: f32) -> f32 {
        self.font
            .horizontal_line_metrics(font_size_px)
            .map(|m| m.ascent)
            .unwrap_or(font_size_px * 0.93)
    }

    pub(crate) fn font(&self) -> &Font {
        &self.font
    }
}

impl GlyphMetrics for FontMetrics {
    fn advance_width(&self, glyph: char, font_size_px: f32) -> f32 {
        self.font.metrics(glyph, font_size_px).advance_width
    }

    fn line_height(&self, font_size_px: f32) -> f32 {
        match self.font.horizontal_line_metrics(font_size_px) {
            // descent is negative in fontdue
            Some(m) => (m.ascent - m.descent + m.line_gap).ceil(),
            None => MonospaceMetrics::default().line_height(font_size_px),
        }
    }
}

impl std::fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetrics")
            .field("units_per_em", &self.font.units_per_em())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_scales_linearly() {
        let m = MonospaceMetrics::default();
        assert!((m.advance_width('@', 10.0) - 6.0).abs() < 1e-5);
        assert!((m.advance_width(' ', 20.0) - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_monospace_line_height_rounds_up() {
        let m = MonospaceMetrics::default();
        // 24 * 1.17 = 28.08
        assert_eq!(m.line_height(24.0), 29.0);
    }

    #[test]
    fn test_font_from_garbage_fails() {
        let err = FontMetrics::from_bytes(b"not a font").unwrap_err();
        assert!(matches!(err, FontError::Parse(_)));
    }

    #[test]
    fn test_font_load_missing_file() {
        let err = FontMetrics::load(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }
}
