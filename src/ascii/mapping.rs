//! Luminance to glyph mapping with ordered dithering, deterministic jitter
//! and cross-frame hysteresis.

/// Default hysteresis band, as a fraction of the palette range.
pub const DEFAULT_HYSTERESIS_BAND: f32 = 0.06;

/// Default jitter seed.
pub const DEFAULT_SEED: u32 = 1337;

/// Jitter levels per palette step of jitter range.
const JITTER_LEVELS_PER_STEP: u8 = 30;

/// 8x8 Bayer threshold matrix (values 0-63).
#[rustfmt::skip]
pub const BAYER_8X8: [[u8; 8]; 8] = [
    [ 0, 32,  8, 40,  2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44,  4, 36, 14, 46,  6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [ 3, 35, 11, 43,  1, 33,  9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47,  7, 39, 13, 45,  5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Ordered-dither offset for a cell, in `[-0.5, 0.5]`.
#[inline]
pub fn bayer_offset(column: usize, row: usize) -> f32 {
    BAYER_8X8[row & 7][column & 7] as f32 / 63.0 - 0.5
}

/// Fast integer hash of a cell position and seed.
///
/// Same inputs always give the same output, so jitter is stable from frame
/// to frame.
#[inline]
pub fn hash32(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed ^ x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x7FEB_352D);
    h = (h ^ (h >> 16)).wrapping_mul(0x85EB_CA6B);
    h = (h ^ (h >> 13)).wrapping_mul(0xC2B2_AE35);
    h ^ (h >> 16)
}

/// Maximum jitter in palette steps for a jitter level (0-100).
pub fn jitter_range(level: u8) -> i32 {
    (level.min(100) / JITTER_LEVELS_PER_STEP) as i32
}

/// Signed jitter for one cell, in `[-range, range]`.
#[inline]
pub fn jitter_offset(column: usize, row: usize, seed: u32, range: i32) -> i32 {
    if range <= 0 {
        return 0;
    }
    let span = (2 * range + 1) as u32;
    (hash32(column as u32, row as u32, seed) % span) as i32 - range
}

/// Settings for one mapping pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapParams {
    /// Jitter level in `[0, 100]`
    pub jitter: u8,
    pub dither: bool,
    pub seed: u32,
    /// Half-width of the keep band, as a fraction of the palette range
    pub hysteresis_band: f32,
}

impl Default for MapParams {
    fn default() -> Self {
        Self {
            jitter: 0,
            dither: false,
            seed: DEFAULT_SEED,
            hysteresis_band: DEFAULT_HYSTERESIS_BAND,
        }
    }
}

/// Palette index chosen for every cell on the previous frame.
#[derive(Debug, Clone, Default)]
pub struct IndexHistory {
    indices: Vec<Option<u16>>,
}

impl IndexHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells tracked.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, cell: usize) -> Option<u16> {
        self.indices.get(cell).copied().flatten()
    }

    /// Forget every cell.
    pub fn reset(&mut self) {
        self.indices.clear();
    }

    /// Size the history for `cells` cells. A size change drops all entries,
    /// since indices from another grid shape describe different cells.
    pub fn ensure_len(&mut self, cells: usize) {
        if self.indices.len() != cells {
            self.indices.clear();
            self.indices.resize(cells, None);
        }
    }
}

/// Ideal palette index for a normalized value.
#[inline]
pub fn quantize(normalized: f32, palette_len: usize) -> usize {
    let top = palette_len.saturating_sub(1);
    ((normalized * top as f32).floor().max(0.0) as usize).min(top)
}

/// Apply hysteresis against the previous choice for a cell.
///
/// The previous index `p` is kept while `normalized` lies within `band` of
/// its threshold `p / (n - 1)`. Otherwise the new index is taken, moving at
/// most one step from `p`. `jitter` is the cell's jitter offset, removed so
/// the threshold is tested on the un-jittered scale.
///
/// A cell dropping just below its threshold keeps its glyph; a cell
/// crossing into the next bucket up switches once and then holds there.
#[inline]
pub fn apply_hysteresis(
    previous: Option<usize>,
    ideal: usize,
    normalized: f32,
    jitter: i32,
    palette_len: usize,
    band: f32,
) -> usize {
    let Some(prev) = previous else {
        return ideal;
    };
    let top = palette_len.saturating_sub(1);
    if top == 0 {
        return 0;
    }
    let prev = prev.min(top);

    let threshold = (prev as i32 - jitter) as f32 / top as f32;
    if (normalized - threshold).abs() <= band {
        prev
    } else {
        ideal.clamp(prev.saturating_sub(1), (prev + 1).min(top))
    }
}

/// Map a luminance grid to text, one glyph per cell, rows joined by `'\n'`
/// with no trailing newline.
///
/// `history` carries the previous frame's choices and is updated with this
/// frame's. It is resized (and so cleared) if it doesn't match the grid.
pub fn map_to_text(
    cells: &[u8],
    columns: usize,
    rows: usize,
    palette: &[char],
    params: &MapParams,
    history: &mut IndexHistory,
) -> String {
    if columns == 0 || rows == 0 {
        return String::new();
    }
    if palette.is_empty() {
        return vec![" ".repeat(columns); rows].join("\n");
    }

    history.ensure_len(columns * rows);
    let n = palette.len();
    let range = jitter_range(params.jitter);
    let band = if params.hysteresis_band.is_finite() {
        params.hysteresis_band.clamp(0.0, 0.5)
    } else {
        DEFAULT_HYSTERESIS_BAND
    };

    let mut text = String::with_capacity(rows * (columns + 1) * 3);
    let mut i = 0;
    for r in 0..rows {
        for c in 0..columns {
            let mut nv = cells.get(i).copied().unwrap_or(0) as f32 / 255.0;
            if params.dither {
                nv = (nv + bayer_offset(c, r) / n as f32).clamp(0.0, 1.0);
            }

            let mut ideal = quantize(nv, n);
            let jitter = jitter_offset(c, r, params.seed, range);
            if jitter != 0 {
                ideal = (ideal as i32 + jitter).clamp(0, n as i32 - 1) as usize;
            }

            let previous = history.get(i).map(usize::from);
            let chosen = apply_hysteresis(previous, ideal, nv, jitter, n, band);

            history.indices[i] = Some(chosen as u16);
            text.push(palette[chosen]);
            i += 1;
        }
        if r + 1 != rows {
            text.push('\n');
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::palette::ASCII_PALETTE;

    #[test]
    fn test_bayer_is_a_permutation() {
        let mut seen = [false; 64];
        for row in BAYER_8X8 {
            for v in row {
                assert!(!seen[v as usize]);
                seen[v as usize] = true;
            }
        }
    }

    #[test]
    fn test_bayer_offset_range() {
        assert_eq!(bayer_offset(0, 0), -0.5);
        assert_eq!(bayer_offset(0, 7), 0.5);
        assert_eq!(bayer_offset(8, 8), bayer_offset(0, 0));
    }

    #[test]
    fn test_hash_is_stable_and_position_sensitive() {
        assert_eq!(hash32(3, 4, 1337), hash32(3, 4, 1337));
        assert_ne!(hash32(3, 4, 1337), hash32(4, 3, 1337));
        assert_ne!(hash32(3, 4, 1337), hash32(3, 4, 1338));
    }

    #[test]
    fn test_jitter_range_levels() {
        assert_eq!(jitter_range(0), 0);
        assert_eq!(jitter_range(29), 0);
        assert_eq!(jitter_range(30), 1);
        assert_eq!(jitter_range(100), 3);
    }

    #[test]
    fn test_jitter_offset_bounded() {
        for r in 0..20 {
            for c in 0..20 {
                let j = jitter_offset(c, r, 7, 2);
                assert!((-2..=2).contains(&j));
            }
        }
        assert_eq!(jitter_offset(5, 5, 7, 0), 0);
    }

    #[test]
    fn test_quantize_edges() {
        assert_eq!(quantize(0.0, 10), 0);
        assert_eq!(quantize(1.0, 10), 9);
        assert_eq!(quantize(0.5, 10), 4);
        assert_eq!(quantize(0.7, 1), 0);
    }

    #[test]
    fn test_hysteresis_keeps_previous_near_threshold() {
        // Palette of 10: index 4 has its threshold at 0.444
        assert_eq!(apply_hysteresis(Some(4), 3, 0.40, 0, 10, 0.06), 4);
        assert_eq!(apply_hysteresis(Some(4), 4, 0.50, 0, 10, 0.06), 4);
    }

    #[test]
    fn test_hysteresis_moves_up_into_next_bucket() {
        // 0.58 sits in bucket 5, well past index 4's threshold
        assert_eq!(apply_hysteresis(Some(4), 5, 0.58, 0, 10, 0.06), 5);
        // Once there, a dip just below the new threshold keeps it
        assert_eq!(apply_hysteresis(Some(5), 4, 0.55, 0, 10, 0.06), 5);
    }

    #[test]
    fn test_hysteresis_threshold_ignores_jitter() {
        // Index 6 was chosen as 4 + jitter 2, so the threshold is still 0.444
        assert_eq!(apply_hysteresis(Some(6), 5, 0.42, 2, 10, 0.06), 6);
        assert_eq!(apply_hysteresis(Some(6), 7, 0.60, 2, 10, 0.06), 7);
    }

    #[test]
    fn test_hysteresis_limits_jump_to_one_step() {
        assert_eq!(apply_hysteresis(Some(4), 9, 1.0, 0, 10, 0.06), 5);
        assert_eq!(apply_hysteresis(Some(4), 0, 0.0, 0, 10, 0.06), 3);
    }

    #[test]
    fn test_hysteresis_without_history_takes_ideal() {
        assert_eq!(apply_hysteresis(None, 7, 0.8, 0, 10, 0.06), 7);
    }

    #[test]
    fn test_map_layout() {
        let cells = vec![0, 255, 0, 255, 0, 255];
        let params = MapParams::default();
        let text = map_to_text(&cells, 3, 2, ASCII_PALETTE, &params, &mut IndexHistory::new());
        assert_eq!(text, " @ \n@ @");
    }

    #[test]
    fn test_map_records_history() {
        let mut history = IndexHistory::new();
        map_to_text(&[0, 128, 255, 64], 2, 2, ASCII_PALETTE, &MapParams::default(), &mut history);
        assert_eq!(history.len(), 4);
        assert_eq!(history.get(0), Some(0));
        assert_eq!(history.get(2), Some(9));
    }

    #[test]
    fn test_history_resize_clears_entries() {
        let mut history = IndexHistory::new();
        map_to_text(&[255; 4], 2, 2, ASCII_PALETTE, &MapParams::default(), &mut history);
        history.ensure_len(9);
        assert_eq!(history.len(), 9);
        assert!((0..9).all(|i| history.get(i).is_none()));
    }

    #[test]
    fn test_dither_breaks_up_flat_field() {
        // A flat value between two levels should produce both levels
        let cells = vec![120u8; 64];
        let params = MapParams {
            dither: true,
            ..MapParams::default()
        };
        let text = map_to_text(&cells, 8, 8, ASCII_PALETTE, &params, &mut IndexHistory::new());
        let distinct: std::collections::HashSet<char> =
            text.chars().filter(|&c| c != '\n').collect();
        assert!(distinct.len() >= 2, "dithered field should mix glyphs: {:?}", distinct);
    }

    #[test]
    fn test_jitter_is_deterministic() {
        let cells: Vec<u8> = (0..100).map(|i| (i * 2) as u8).collect();
        let params = MapParams {
            jitter: 100,
            ..MapParams::default()
        };
        let a = map_to_text(&cells, 10, 10, ASCII_PALETTE, &params, &mut IndexHistory::new());
        let b = map_to_text(&cells, 10, 10, ASCII_PALETTE, &params, &mut IndexHistory::new());
        assert_eq!(a, b);
        let plain = map_to_text(
            &cells,
            10,
            10,
            ASCII_PALETTE,
            &MapParams::default(),
            &mut IndexHistory::new(),
        );
        assert_ne!(a, plain);
    }

    #[test]
    fn test_empty_palette_yields_blank_grid() {
        let params = MapParams::default();
        let text = map_to_text(&[10, 20], 2, 1, &[], &params, &mut IndexHistory::new());
        assert_eq!(text, "  ");
    }
}
