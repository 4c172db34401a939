//! Glyph-art pipeline stages.
//!
//! Each stage is a plain function over slices so it can be tested alone;
//! [`crate::engine::Engine`] composes them and owns the cross-frame state.
//!
//! 1. **Grid planning** - columns, rows and font size from real glyph metrics
//! 2. **Sampling** - grayscale plus summed-area table, one mean per cell
//! 3. **Tone mapping** - auto levels, contrast, S-curve, gamma
//! 4. **Sharpening** - 3x3 unsharp mask over the cell grid
//! 5. **Palette mapping** - Bayer dither, seeded jitter, hysteresis
//!
//! # Effects
//!
//! Each [`Effect`] resolves to one ordered glyph palette:
//! - `Ascii` - 10-level ASCII density ramp
//! - `Squares` - block shades and partial fills
//! - `Circles` - dots and rings
//! - `Diamonds` - quadrants and diamonds
//! - `Shapes` - mixed shapes tuned for faces

mod grayscale;
pub mod grid;
mod mapping;
mod metrics;
mod palette;
mod sample;
mod sharpen;
pub mod tone;

pub use grayscale::{histogram, luminance, to_grayscale, to_grayscale_into};
pub use grid::{
    effective_cell_budget, measure_cell, plan, target_grid, GridPlan, GridRequest, MIN_CELL_BUDGET,
    MIN_GRID_DIM,
};
pub use mapping::{
    apply_hysteresis, bayer_offset, hash32, jitter_offset, jitter_range, map_to_text, quantize,
    IndexHistory, MapParams, BAYER_8X8, DEFAULT_HYSTERESIS_BAND, DEFAULT_SEED,
};
pub use metrics::{FontError, FontMetrics, GlyphMetrics, MonospaceMetrics};
pub use palette::{
    Effect, ASCII_PALETTE, CIRCLES_PALETTE, DIAMONDS_PALETTE, SHAPES_PALETTE, SQUARES_PALETTE,
};
pub use sample::{sample, IntegralImage};
pub use sharpen::{box_blur, unsharp, DEFAULT_UNSHARP_AMOUNT};
pub use tone::{
    contrast_factor, tone_map, tone_value, LevelSmoother, Levels, ToneParams, DEFAULT_CLIP_FRACTION,
    DEFAULT_GAMMA, DEFAULT_LEVEL_SMOOTHING,
};
