//! Grid planning: how many glyph columns and rows fill the output area, and
//! at what font size.
//!
//! The detail level picks a target grid between a coarse poster-like layout
//! and a fine one. The font size is then fitted to the output area with a
//! fixed number of rescale passes against real measured glyph metrics.

use serde::Serialize;

use super::metrics::GlyphMetrics;

/// Target grid at detail 0.0 (large glyphs).
pub const MIN_TARGET_COLUMNS: u32 = 12;
pub const MIN_TARGET_ROWS: u32 = 8;

/// Target grid at detail 1.0 (small glyphs).
pub const MAX_TARGET_COLUMNS: u32 = 220;
pub const MAX_TARGET_ROWS: u32 = 160;

/// Hard floor on either grid dimension.
pub const MIN_GRID_DIM: u32 = 8;

/// Floor of the effective cell budget.
pub const MIN_CELL_BUDGET: u32 = 512;

/// Font sizes are clamped into this range (pixels).
pub const MIN_FONT_PX: f32 = 6.0;
pub const MAX_FONT_PX: f32 = 64.0;

/// Number of font rescale passes. Fixed so worst-case latency is bounded.
pub const PLAN_PASSES: usize = 2;

/// Shrink applied on every rescale so rounding never overflows the area.
pub const FIT_SAFETY: f32 = 0.985;

/// Percentile of glyph widths used as the cell width.
const WIDTH_PERCENTILE: f32 = 0.9;

/// Inputs that determine a grid plan.
///
/// Two requests that compare equal always produce the same plan, which is
/// what makes the plan cacheable across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRequest {
    pub output_width_px: u32,
    pub output_height_px: u32,
    /// Detail level in `[0, 1]`
    pub detail: f32,
    pub max_cells: u32,
    pub base_font_px: f32,
    pub letter_spacing_em: f32,
}

impl GridRequest {
    /// Clamp every field into its valid range.
    pub fn sanitized(&self) -> GridRequest {
        GridRequest {
            output_width_px: self.output_width_px.max(1),
            output_height_px: self.output_height_px.max(1),
            detail: clamp_unit(self.detail),
            max_cells: self.max_cells,
            base_font_px: finite_or(self.base_font_px, 24.0).clamp(MIN_FONT_PX, MAX_FONT_PX),
            letter_spacing_em: finite_or(self.letter_spacing_em, 0.0).clamp(-0.25, 1.0),
        }
    }
}

/// A computed grid layout.
///
/// The consumer lays the text out with `font_size_px` and `line_height_px`
/// verbatim, without wrapping or extra font padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPlan {
    pub columns: u32,
    pub rows: u32,
    pub font_size_px: f32,
    pub glyph_width_px: f32,
    pub line_height_px: f32,
    /// True when the cell budget forced a smaller grid
    pub was_clamped: bool,
}

impl GridPlan {
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// Target grid for a detail level, by linear interpolation between the
/// coarse and fine grids.
pub fn target_grid(detail: f32) -> (u32, u32) {
    let detail = clamp_unit(detail);
    let column_span = (MAX_TARGET_COLUMNS - MIN_TARGET_COLUMNS) as f32;
    let row_span = (MAX_TARGET_ROWS - MIN_TARGET_ROWS) as f32;
    let columns = (MIN_TARGET_COLUMNS as f32 + column_span * detail) as u32;
    let rows = (MIN_TARGET_ROWS as f32 + row_span * detail) as u32;
    (columns, rows)
}

/// Cell budget for a detail level: a quarter of `max_cells` at detail 0,
/// all of it at detail 1, never below [`MIN_CELL_BUDGET`].
pub fn effective_cell_budget(detail: f32, max_cells: u32) -> u32 {
    let detail = clamp_unit(detail);
    let scaled = (max_cells as f32 * (0.25 + 0.75 * detail)) as u32;
    scaled.max(MIN_CELL_BUDGET)
}

/// Measure the cell width and line height of a palette at a font size.
///
/// The cell width is the 90th percentile of glyph advances rather than the
/// maximum, so one unusually wide glyph doesn't stretch the whole grid.
pub fn measure_cell<M: GlyphMetrics>(
    metrics: &M,
    palette: &[char],
    font_size_px: f32,
    letter_spacing_em: f32,
) -> (f32, f32) {
    let spacing = letter_spacing_em * font_size_px;
    let mut widths: Vec<f32> = palette
        .iter()
        .map(|&g| metrics.advance_width(g, font_size_px) + spacing)
        .collect();
    widths.sort_by(|a, b| a.total_cmp(b));

    let glyph_width = if widths.is_empty() {
        font_size_px * 0.6
    } else {
        let idx = ((widths.len() as f32 * WIDTH_PERCENTILE) as usize).min(widths.len() - 1);
        widths[idx]
    };
    let line_height = metrics.line_height(font_size_px);

    (glyph_width.max(0.1), line_height.max(1.0))
}

/// Plan the grid for one rendering configuration.
///
/// Never fails: every input is clamped first. The planned columns and rows
/// are authoritative; they are not recomputed from the final metrics.
pub fn plan<M: GlyphMetrics>(request: &GridRequest, palette: &[char], metrics: &M) -> GridPlan {
    let req = request.sanitized();
    let width = req.output_width_px as f32;
    let height = req.output_height_px as f32;
    let (target_cols, target_rows) = target_grid(req.detail);

    let mut font_px = req.base_font_px;
    let mut cols = target_cols;
    let mut rows = target_rows;

    for _ in 0..PLAN_PASSES {
        let (glyph_w, line_h) = measure_cell(metrics, palette, font_px, req.letter_spacing_em);
        let max_cols = ((width / glyph_w).floor() as u32).max(MIN_GRID_DIM);
        let max_rows = ((height / line_h).floor() as u32).max(MIN_GRID_DIM);

        cols = target_cols.min(max_cols);
        rows = target_rows.min(max_rows);

        let scale_w = width / (cols as f32 * glyph_w);
        let scale_h = height / (rows as f32 * line_h);
        font_px = (font_px * scale_w.min(scale_h) * FIT_SAFETY).clamp(MIN_FONT_PX, MAX_FONT_PX);
    }

    let (glyph_width_px, line_height_px) =
        measure_cell(metrics, palette, font_px, req.letter_spacing_em);

    let budget = effective_cell_budget(req.detail, req.max_cells);
    let cells = cols as u64 * rows as u64;
    let mut was_clamped = false;

    if cells > budget as u64 {
        let k = (budget as f64 / cells as f64).sqrt();
        cols = ((cols as f64 * k).floor() as u32).max(MIN_GRID_DIM);
        rows = ((rows as f64 * k).floor() as u32).max(MIN_GRID_DIM);
        // The floor can push a very lopsided grid back over budget
        if cols as u64 * rows as u64 > budget as u64 {
            cols = (budget / rows).max(MIN_GRID_DIM);
        }
        if cols as u64 * rows as u64 > budget as u64 {
            rows = (budget / cols).max(MIN_GRID_DIM);
        }
        was_clamped = true;
        log::warn!(
            "Cell budget {} clamped grid from {} cells to {}x{}",
            budget,
            cells,
            cols,
            rows
        );
    }

    GridPlan {
        columns: cols,
        rows,
        font_size_px: font_px,
        glyph_width_px,
        line_height_px,
        was_clamped,
    }
}

fn clamp_unit(v: f32) -> f32 {
    finite_or(v, 0.0).clamp(0.0, 1.0)
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
