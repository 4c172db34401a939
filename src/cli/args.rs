//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::EffectArg;

/// Render photos and frames as glyph art
#[derive(Parser, Debug)]
#[command(name = "glyphcam")]
#[command(version, about = "Render images as stable character-grid art", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render an image to glyph text
    Render(RenderArgs),
    /// List available effects and their palettes
    Effects,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Options for the render subcommand. Unset values fall back to the config file.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Image file to render (png, jpeg, webp)
    #[arg(required_unless_present = "test_pattern")]
    pub image: Option<PathBuf>,

    /// Render a built-in gradient instead of an image file
    #[arg(long, conflicts_with = "image")]
    pub test_pattern: bool,

    /// Glyph palette
    #[arg(long, short)]
    pub effect: Option<EffectArg>,

    /// Grid detail (0-100)
    #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub detail: Option<u8>,

    /// Deterministic glyph variation (0-100)
    #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub jitter: Option<u8>,

    /// Contrast boost (0-100)
    #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub softness: Option<u8>,

    /// Output width in device pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in device pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Enable ordered dithering
    #[arg(long)]
    pub dither: bool,

    /// Mirror the image horizontally
    #[arg(long)]
    pub mirror: bool,

    /// Skip downscaling large images before rendering
    #[arg(long)]
    pub full_res: bool,

    /// Font file for glyph metrics and PNG output
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Also draw the result into a PNG (requires a font)
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Print text and grid as JSON
    #[arg(long)]
    pub json: bool,

    /// Render the image this many times through one engine
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub frames: u32,
}
