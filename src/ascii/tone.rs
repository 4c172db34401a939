//! Tone mapping of per-cell luminance for legibility.
//!
//! Order per cell: auto levels, contrast around mid-gray, a soft S-curve,
//! then gamma. Auto levels come from the full-resolution histogram and are
//! smoothed across frames so live video doesn't pump in brightness.

/// Default EMA weight of the newest auto-level measurement.
pub const DEFAULT_LEVEL_SMOOTHING: f32 = 0.2;

/// Default gamma; values above 1 lift shadows and keep highlight detail.
pub const DEFAULT_GAMMA: f32 = 1.6;

/// Default fraction of pixels clipped at each end of the histogram.
pub const DEFAULT_CLIP_FRACTION: f32 = 0.01;

/// Contrast gain at contrast level 100, on top of unity.
const MAX_CONTRAST_GAIN: f32 = 2.2;

/// Black and white points of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    pub black: i32,
    pub white: i32,
}

impl Levels {
    /// Identity mapping.
    pub const FULL: Levels = Levels {
        black: 0,
        white: 255,
    };

    /// Find the black point at the `clip` percentile and the white point at
    /// `1 - clip`. A degenerate histogram falls back to [`Levels::FULL`].
    pub fn from_histogram(hist: &[u32; 256], clip: f32) -> Levels {
        let total: u64 = hist.iter().map(|&c| c as u64).sum();
        let clip = sanitize_clip(clip);

        let percentile = |p: f32| -> i32 {
            let target = (total as f64 * p as f64) as u64;
            let mut acc = 0u64;
            for (i, &count) in hist.iter().enumerate() {
                acc += count as u64;
                if acc >= target {
                    return i as i32;
                }
            }
            255
        };

        let black = percentile(clip);
        let white = percentile(1.0 - clip);
        if white <= black + 1 {
            Levels::FULL
        } else {
            Levels { black, white }
        }
    }
}

/// Exponential moving average of auto levels across frames.
#[derive(Debug, Clone)]
pub struct LevelSmoother {
    alpha: f32,
    current: Option<Levels>,
}

impl LevelSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { DEFAULT_LEVEL_SMOOTHING },
            current: None,
        }
    }

    /// Blend a new measurement into the running value. The first measurement
    /// after construction or [`reset`](Self::reset) is taken as-is.
    pub fn smooth(&mut self, raw: Levels) -> Levels {
        let next = match self.current {
            None => raw,
            Some(prev) => Levels {
                black: prev.black + ((raw.black - prev.black) as f32 * self.alpha) as i32,
                white: prev.white + ((raw.white - prev.white) as f32 * self.alpha) as i32,
            },
        };
        self.current = Some(next);
        next
    }

    pub fn current(&self) -> Option<Levels> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

impl Default for LevelSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_SMOOTHING)
    }
}

/// Per-frame tone settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    /// Contrast level in `[0, 100]`
    pub contrast: u8,
    pub gamma: f32,
    pub clip_fraction: f32,
    pub auto_levels: bool,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            contrast: 0,
            gamma: DEFAULT_GAMMA,
            clip_fraction: DEFAULT_CLIP_FRACTION,
            auto_levels: true,
        }
    }
}

/// Gain applied around mid-gray for a contrast level.
pub fn contrast_factor(contrast: u8) -> f32 {
    1.0 + (contrast.min(100) as f32 / 100.0) * MAX_CONTRAST_GAIN
}

/// Tone-map one luminance value.
#[inline]
pub fn tone_value(v: u8, levels: Levels, contrast_gain: f32, gamma: f32) -> u8 {
    let range = (levels.white - levels.black).max(1) as f32;
    let v = (((v as i32 - levels.black) as f32 * 255.0 / range) as i32).clamp(0, 255);

    let v = (((v - 128) as f32 * contrast_gain + 128.0) as i32).clamp(0, 255);

    let t = v as f32 / 255.0;
    let s = (1.1 * t - 0.05).clamp(0.0, 1.0);

    let out = s.powf(1.0 / gamma);
    ((out * 255.0) as i32).clamp(0, 255) as u8
}

/// Tone-map a luminance grid in place.
///
/// `hist` is the histogram of the full-resolution source grayscale, not of
/// the grid. With auto levels off, the smoother is left untouched.
pub fn tone_map(
    cells: &mut [u8],
    hist: &[u32; 256],
    params: &ToneParams,
    smoother: &mut LevelSmoother,
) {
    let levels = if params.auto_levels {
        let raw = Levels::from_histogram(hist, params.clip_fraction);
        let smoothed = smoother.smooth(raw);
        log::trace!(
            "Auto levels raw {}..{} smoothed {}..{}",
            raw.black,
            raw.white,
            smoothed.black,
            smoothed.white
        );
        smoothed
    } else {
        Levels::FULL
    };

    let gain = contrast_factor(params.contrast);
    let gamma = sanitize_gamma(params.gamma);
    for v in cells.iter_mut() {
        *v = tone_value(*v, levels, gain, gamma);
    }
}

fn sanitize_gamma(gamma: f32) -> f32 {
    if gamma.is_finite() {
        gamma.clamp(0.1, 5.0)
    } else {
        DEFAULT_GAMMA
    }
}

fn sanitize_clip(clip: f32) -> f32 {
    if clip.is_finite() {
        clip.clamp(0.0, 0.49)
    } else {
        DEFAULT_CLIP_FRACTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist_of(values: &[(u8, u32)]) -> [u32; 256] {
        let mut h = [0u32; 256];
        for &(v, n) in values {
            h[v as usize] += n;
        }
        h
    }

    #[test]
    fn test_levels_from_spread_histogram() {
        let hist = hist_of(&[(20, 50), (100, 900), (230, 50)]);
        let levels = Levels::from_histogram(&hist, 0.01);
        assert_eq!(levels, Levels { black: 20, white: 230 });
    }

    #[test]
    fn test_levels_uniform_field_falls_back() {
        let hist = hist_of(&[(128, 4096)]);
        assert_eq!(Levels::from_histogram(&hist, 0.01), Levels::FULL);
    }

    #[test]
    fn test_smoother_first_value_passes_through() {
        let mut s = LevelSmoother::new(0.2);
        let raw = Levels { black: 40, white: 200 };
        assert_eq!(s.smooth(raw), raw);
    }

    #[test]
    fn test_smoother_moves_a_fraction() {
        let mut s = LevelSmoother::new(0.2);
        s.smooth(Levels { black: 0, white: 200 });
        let next = s.smooth(Levels { black: 100, white: 250 });
        assert_eq!(next, Levels { black: 20, white: 210 });
        s.reset();
        assert_eq!(s.current(), None);
    }

    #[test]
    fn test_contrast_factor_range() {
        assert_eq!(contrast_factor(0), 1.0);
        assert!((contrast_factor(100) - 3.2).abs() < 1e-5);
        assert_eq!(contrast_factor(250), contrast_factor(100));
    }

    #[test]
    fn test_extremes_are_fixed_points() {
        for gain in [1.0, 2.0, 3.2] {
            for gamma in [1.0, 1.6, 2.2] {
                assert_eq!(tone_value(0, Levels::FULL, gain, gamma), 0);
                assert_eq!(tone_value(255, Levels::FULL, gain, gamma), 255);
            }
        }
    }

    #[test]
    fn test_mid_gray_neutral_settings() {
        // S-curve: 1.1 * 128/255 - 0.05 = 0.50216 -> 128
        assert_eq!(tone_value(128, Levels::FULL, 1.0, 1.0), 128);
    }

    #[test]
    fn test_gamma_lifts_shadows() {
        let flat = tone_value(60, Levels::FULL, 1.0, 1.0);
        let lifted = tone_value(60, Levels::FULL, 1.0, 1.6);
        assert!(lifted > flat, "{} should exceed {}", lifted, flat);
    }

    #[test]
    fn test_levels_stretch_range() {
        let levels = Levels { black: 50, white: 150 };
        assert_eq!(tone_value(50, levels, 1.0, 1.0), 0);
        assert_eq!(tone_value(150, levels, 1.0, 1.0), 255);
    }

    #[test]
    fn test_tone_map_without_auto_levels_skips_smoother() {
        let mut cells = vec![0, 128, 255];
        let mut smoother = LevelSmoother::default();
        let params = ToneParams {
            gamma: 1.0,
            auto_levels: false,
            ..ToneParams::default()
        };
        tone_map(&mut cells, &[0; 256], &params, &mut smoother);
        assert_eq!(cells, vec![0, 128, 255]);
        assert_eq!(smoother.current(), None);
    }

    #[test]
    fn test_tone_map_black_and_white_fields() {
        let params = ToneParams::default();

        let mut black = vec![0u8; 16];
        tone_map(&mut black, &hist_of(&[(0, 1000)]), &params, &mut LevelSmoother::default());
        assert!(black.iter().all(|&v| v == 0));

        let mut white = vec![255u8; 16];
        tone_map(&mut white, &hist_of(&[(255, 1000)]), &params, &mut LevelSmoother::default());
        assert!(white.iter().all(|&v| v == 255));
    }
}
