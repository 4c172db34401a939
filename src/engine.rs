//! Frame-to-text rendering engine.
//!
//! [`Engine`] runs the pipeline stages in order and owns the state that keeps
//! consecutive frames stable: the cached grid plan, the smoothed auto levels
//! and the per-cell palette index history.
//!
//! One engine serves one capture session. Calls must be serialized by the
//! caller; the engine does no locking, buffering or cancellation.

use serde::{Deserialize, Serialize};

use crate::ascii::{
    self, histogram, map_to_text, tone_map, to_grayscale_into, unsharp, Effect, GlyphMetrics,
    GridPlan, GridRequest, IndexHistory, IntegralImage, LevelSmoother, Levels, MapParams,
    MonospaceMetrics, ToneParams,
};
use crate::frame::SourceImage;

/// Engine constants. Every field may be omitted from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Font size the grid planner starts from (pixels)
    pub base_font_px: f32,
    pub letter_spacing_em: f32,
    /// Upper bound on rendered cells, reached at full detail
    pub max_cells: u32,
    pub gamma: f32,
    /// Ordered dithering; best left off for live video
    pub dither: bool,
    pub unsharp_amount: f32,
    /// Histogram fraction clipped at each end by auto levels
    pub clip_fraction: f32,
    pub auto_levels: bool,
    /// EMA weight of each new auto-level measurement
    pub level_smoothing: f32,
    /// Keep band around the previous glyph, as a fraction of the palette range
    pub hysteresis_band: f32,
    pub seed: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_font_px: 24.0,
            letter_spacing_em: 0.0,
            max_cells: 80_000,
            gamma: ascii::DEFAULT_GAMMA,
            dither: false,
            unsharp_amount: ascii::DEFAULT_UNSHARP_AMOUNT,
            clip_fraction: ascii::DEFAULT_CLIP_FRACTION,
            auto_levels: true,
            level_smoothing: ascii::DEFAULT_LEVEL_SMOOTHING,
            hysteresis_band: ascii::DEFAULT_HYSTERESIS_BAND,
            seed: ascii::DEFAULT_SEED,
        }
    }
}

/// Per-frame render inputs. Levels are 0-100 and clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub effect: Effect,
    /// Grid detail; 0 is a coarse poster grid, 100 the finest
    pub detail: u8,
    /// Deterministic per-cell glyph variation
    pub jitter: u8,
    /// Drives tone-map contrast
    pub softness: u8,
    /// Output area in device pixels
    pub output_width_px: u32,
    pub output_height_px: u32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            effect: Effect::default(),
            detail: 50,
            jitter: 25,
            softness: 25,
            output_width_px: 1080,
            output_height_px: 1920,
        }
    }
}

/// Rendered text plus the grid the consumer must lay it out with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    /// `grid.rows` lines of `grid.columns` glyphs, joined by `'\n'`
    pub text: String,
    pub grid: GridPlan,
}

impl RenderOutput {
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }
}

/// Everything that determines the grid plan.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridKey {
    effect: Effect,
    request: GridRequest,
}

/// Cross-frame state of one engine.
///
/// All three parts are dropped together whenever the grid key changes: a
/// different grid makes per-cell history and the level history meaningless.
#[derive(Debug, Clone, Default)]
pub struct StabilizationState {
    grid: Option<(GridKey, GridPlan)>,
    levels: LevelSmoother,
    history: IndexHistory,
}

impl StabilizationState {
    fn with_smoothing(alpha: f32) -> Self {
        Self {
            grid: None,
            levels: LevelSmoother::new(alpha),
            history: IndexHistory::new(),
        }
    }

    /// The grid plan reused by the next render with the same key.
    pub fn cached_plan(&self) -> Option<GridPlan> {
        self.grid.map(|(_, plan)| plan)
    }

    /// Current smoothed auto levels, if any frame has been measured.
    pub fn levels(&self) -> Option<Levels> {
        self.levels.current()
    }

    pub fn history(&self) -> &IndexHistory {
        &self.history
    }

    /// Drop the grid cache, level history and index history.
    pub fn reset(&mut self) {
        self.grid = None;
        self.levels.reset();
        self.history.reset();
    }
}

/// Renders frames to glyph text, keeping consecutive frames stable.
#[derive(Debug)]
pub struct Engine<M: GlyphMetrics = MonospaceMetrics> {
    metrics: M,
    tuning: Tuning,
    state: StabilizationState,
    // Per-frame scratch buffers, reused across calls
    gray: Vec<u8>,
    cells: Vec<u8>,
}

impl Engine<MonospaceMetrics> {
    /// Engine with default tuning and approximate monospace metrics.
    pub fn new() -> Self {
        Self::with_metrics(MonospaceMetrics::default(), Tuning::default())
    }
}

impl Default for Engine<MonospaceMetrics> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: GlyphMetrics> Engine<M> {
    pub fn with_metrics(metrics: M, tuning: Tuning) -> Self {
        Self {
            metrics,
            state: StabilizationState::with_smoothing(tuning.level_smoothing),
            tuning,
            gray: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Replace the tuning. Stabilization state is cleared.
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        self.state = StabilizationState::with_smoothing(tuning.level_smoothing);
    }

    pub fn state(&self) -> &StabilizationState {
        &self.state
    }

    /// Forget all cross-frame state, as if the engine were new.
    pub fn reset(&mut self) {
        log::debug!("Stabilization state reset");
        self.state.reset();
    }

    /// Plan the grid for `request`, reusing the cached plan when the grid
    /// key is unchanged.
    pub fn plan(&mut self, request: &RenderRequest) -> GridPlan {
        let key = GridKey {
            effect: request.effect,
            request: GridRequest {
                output_width_px: request.output_width_px,
                output_height_px: request.output_height_px,
                detail: request.detail.min(100) as f32 / 100.0,
                max_cells: self.tuning.max_cells,
                base_font_px: self.tuning.base_font_px,
                letter_spacing_em: self.tuning.letter_spacing_em,
            }
            .sanitized(),
        };

        if let Some((cached_key, plan)) = self.state.grid {
            if cached_key == key {
                return plan;
            }
            log::debug!("Grid key changed; clearing level and index history");
        }

        self.state.levels.reset();
        self.state.history.reset();
        let plan = ascii::plan(&key.request, request.effect.palette(), &self.metrics);
        log::debug!(
            "Planned {}x{} grid for {} at {}x{}px: font {:.2}px, line {:.2}px",
            plan.columns,
            plan.rows,
            request.effect.name(),
            key.request.output_width_px,
            key.request.output_height_px,
            plan.font_size_px,
            plan.line_height_px
        );
        self.state.grid = Some((key, plan));
        plan
    }

    /// Render one frame.
    ///
    /// Never fails: the image was validated on construction and every
    /// numeric input is clamped.
    pub fn render(&mut self, image: &SourceImage, request: &RenderRequest) -> RenderOutput {
        let grid = self.plan(request);
        let columns = grid.columns as usize;
        let rows = grid.rows as usize;

        to_grayscale_into(image, &mut self.gray);
        let integral = IntegralImage::new(&self.gray, image.width(), image.height());
        integral.sample_into(grid.columns, grid.rows, &mut self.cells);

        let tone = ToneParams {
            contrast: request.softness.min(100),
            gamma: self.tuning.gamma,
            clip_fraction: self.tuning.clip_fraction,
            auto_levels: self.tuning.auto_levels,
        };
        let hist = if tone.auto_levels {
            histogram(&self.gray)
        } else {
            [0; 256]
        };
        tone_map(&mut self.cells, &hist, &tone, &mut self.state.levels);

        unsharp(&mut self.cells, columns, rows, self.tuning.unsharp_amount);

        let map = MapParams {
            jitter: request.jitter.min(100),
            dither: self.tuning.dither,
            seed: self.tuning.seed,
            hysteresis_band: self.tuning.hysteresis_band,
        };
        let text = map_to_text(
            &self.cells,
            columns,
            rows,
            request.effect.palette(),
            &map,
            &mut self.state.history,
        );

        RenderOutput { text, grid }
    }
}
