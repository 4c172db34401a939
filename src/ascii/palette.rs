//! Glyph palettes for each visual effect.
//!
//! Every palette is ordered from emptiest (index 0, drawn for dark cells) to
//! densest (last index, drawn for bright cells).

use serde::{Deserialize, Serialize};

/// Plain ASCII density ramp (10 levels).
pub const ASCII_PALETTE: &[char] = &[' ', '.', ':', '=', '-', '+', '*', '#', '%', '@'];

/// Block shades and partial fills (12 levels).
pub const SQUARES_PALETTE: &[char] = &[
    ' ', '░', '▁', '▂', '▃', '▄', '▒', '▅', '▆', '▇', '▓', '█',
];

/// Dot and ring ramp (15 levels).
pub const CIRCLES_PALETTE: &[char] = &[
    ' ', '.', '·', '˙', '∙', '⋅', '∘', '○', '◌', '◦', '⊙', '⊚', '●', '◉', '◎',
];

/// Quadrants and diamonds (16 levels).
pub const DIAMONDS_PALETTE: &[char] = &[
    ' ', '.', '·', '▖', '▗', '▘', '▝', '▚', '▞', '◇', '◈', '▙', '▛', '▜', '▟', '█',
];

/// Narrow mixed-shape ramp that reads well on faces (13 levels).
pub const SHAPES_PALETTE: &[char] = &[
    ' ', '·', ':', '-', '=', '+', '*', 'o', 'O', '0', '■', '▓', '█',
];

/// Visual effect, each backed by one constant glyph palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    Ascii,
    Squares,
    Circles,
    Diamonds,
    Shapes,
}

impl Effect {
    pub const ALL: [Effect; 5] = [
        Effect::Ascii,
        Effect::Squares,
        Effect::Circles,
        Effect::Diamonds,
        Effect::Shapes,
    ];

    /// Resolve the effect to its ordered glyph list.
    pub fn palette(&self) -> &'static [char] {
        match self {
            Effect::Ascii => ASCII_PALETTE,
            Effect::Squares => SQUARES_PALETTE,
            Effect::Circles => CIRCLES_PALETTE,
            Effect::Diamonds => DIAMONDS_PALETTE,
            Effect::Shapes => SHAPES_PALETTE,
        }
    }

    /// Get a human-readable name for the effect.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Ascii => "ascii",
            Effect::Squares => "squares",
            Effect::Circles => "circles",
            Effect::Diamonds => "diamonds",
            Effect::Shapes => "shapes",
        }
    }

    /// Look an effect up by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Effect> {
        Effect::ALL
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_sizes() {
        assert_eq!(Effect::Ascii.palette().len(), 10);
        assert_eq!(Effect::Squares.palette().len(), 12);
        assert_eq!(Effect::Circles.palette().len(), 15);
        assert_eq!(Effect::Diamonds.palette().len(), 16);
        assert_eq!(Effect::Shapes.palette().len(), 13);
    }

    #[test]
    fn test_palettes_start_empty() {
        for effect in Effect::ALL {
            assert_eq!(effect.palette()[0], ' ', "{} should start with a space", effect.name());
        }
    }

    #[test]
    fn test_from_name_round_trips() {
        for effect in Effect::ALL {
            assert_eq!(Effect::from_name(effect.name()), Some(effect));
        }
        assert_eq!(Effect::from_name("DIAMONDS"), Some(Effect::Diamonds));
        assert_eq!(Effect::from_name("triangle"), None);
    }
}
