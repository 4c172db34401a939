//! CLI enum types.

use clap::ValueEnum;

use crate::ascii::Effect;

/// Visual effect (glyph palette) for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EffectArg {
    #[default]
    Ascii,
    Squares,
    Circles,
    Diamonds,
    Shapes,
}

impl From<EffectArg> for Effect {
    fn from(e: EffectArg) -> Self {
        match e {
            EffectArg::Ascii => Effect::Ascii,
            EffectArg::Squares => Effect::Squares,
            EffectArg::Circles => Effect::Circles,
            EffectArg::Diamonds => Effect::Diamonds,
            EffectArg::Shapes => Effect::Shapes,
        }
    }
}
