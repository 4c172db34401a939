//! Subcommand handlers for render, effects and config actions.

use std::path::Path;

use thiserror::Error;

use super::args::{ConfigAction, RenderArgs};
use crate::ascii::{Effect, FontError, FontMetrics, GlyphMetrics, MonospaceMetrics};
use crate::config::{default_path as get_config_path, Config, ConfigError};
use crate::engine::{Engine, RenderOutput, RenderRequest, Tuning};
use crate::frame::{FrameError, SourceImage};
use crate::raster::{render_bitmap, RasterError, RasterStyle};

/// Source images larger than this are downscaled before rendering.
pub const MAX_SOURCE_WIDTH: u32 = 500;
pub const MAX_SOURCE_HEIGHT: u32 = 375;

/// Size of the generated test pattern.
const TEST_PATTERN_SIZE: (u32, u32) = (200, 150);

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("Invalid image: {0}")]
    Frame(#[from] FrameError),

    #[error("Failed to open image '{path}': {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to draw bitmap: {0}")]
    Raster(#[from] RasterError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PNG output requires a font (--font or [font] path in config)")]
    PngWithoutFont,

    #[error("Config file already exists: {0}")]
    ConfigExists(String),
}

/// Render one image according to CLI flags merged over the config file.
///
/// Precedence: CLI flag > config file > built-in default.
pub fn run_render(args: &RenderArgs, config: &Config) -> Result<(), CliError> {
    let request = merge_request(args, config);
    let mut tuning = config.tuning;
    tuning.dither |= args.dither;

    let mut image = load_source(args)?;
    if args.mirror {
        image.mirror_horizontal();
    }
    if !args.full_res {
        image = image.fit_within(MAX_SOURCE_WIDTH, MAX_SOURCE_HEIGHT);
    }
    log::info!(
        "Rendering {}x{} source as {} at {}x{}px",
        image.width(),
        image.height(),
        request.effect.name(),
        request.output_width_px,
        request.output_height_px
    );

    let font_path = args.font.as_deref().or(config.font.path.as_deref());
    match font_path {
        Some(path) => {
            let font = FontMetrics::load(path)?;
            let output = render_frames(&font, tuning, &image, &request, args.frames);
            emit(&output, args.json)?;
            if let Some(png) = &args.png {
                write_png(&output, &font, png)?;
            }
        }
        None => {
            if args.png.is_some() {
                return Err(CliError::PngWithoutFont);
            }
            let metrics = MonospaceMetrics::default();
            let output = render_frames(metrics, tuning, &image, &request, args.frames);
            emit(&output, args.json)?;
        }
    }

    Ok(())
}

/// Merge CLI overrides into the configured render settings.
pub fn merge_request(args: &RenderArgs, config: &Config) -> RenderRequest {
    let base: RenderRequest = config.render.into();
    RenderRequest {
        effect: args.effect.map(Effect::from).unwrap_or(base.effect),
        detail: args.detail.unwrap_or(base.detail),
        jitter: args.jitter.unwrap_or(base.jitter),
        softness: args.softness.unwrap_or(base.softness),
        output_width_px: args.width.unwrap_or(base.output_width_px),
        output_height_px: args.height.unwrap_or(base.output_height_px),
    }
}

fn load_source(args: &RenderArgs) -> Result<SourceImage, CliError> {
    match &args.image {
        Some(path) if !args.test_pattern => {
            let decoded = image::open(path).map_err(|e| CliError::Image {
                path: path.display().to_string(),
                source: e,
            })?;
            Ok(SourceImage::from_rgb_image(decoded.to_rgb8())?)
        }
        _ => Ok(SourceImage::test_pattern(TEST_PATTERN_SIZE.0, TEST_PATTERN_SIZE.1)?),
    }
}

fn render_frames<M: GlyphMetrics>(
    metrics: M,
    tuning: Tuning,
    image: &SourceImage,
    request: &RenderRequest,
    frames: u32,
) -> RenderOutput {
    let mut engine = Engine::with_metrics(metrics, tuning);
    let mut output = engine.render(image, request);
    for _ in 1..frames {
        output = engine.render(image, request);
    }
    log::info!(
        "Grid {}x{}, font {:.1}px, line {:.1}px{}",
        output.grid.columns,
        output.grid.rows,
        output.grid.font_size_px,
        output.grid.line_height_px,
        if output.grid.was_clamped { " (clamped)" } else { "" }
    );
    output
}

fn emit(output: &RenderOutput, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
    } else {
        println!("{}", output.text);
    }
    Ok(())
}

fn write_png(output: &RenderOutput, font: &FontMetrics, path: &Path) -> Result<(), CliError> {
    let img = render_bitmap(output, font, &RasterStyle::default())?;
    img.save(path).map_err(|e| CliError::Image {
        path: path.display().to_string(),
        source: e,
    })?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Print every effect with its palette.
pub fn list_effects() {
    println!("Available effects:");
    for effect in Effect::ALL {
        let glyphs: String = effect.palette().iter().collect();
        println!("  {:<9} {:>2} levels  [{}]", effect.name(), effect.palette().len(), glyphs);
    }
    println!();
    println!("Use --effect <name> to select an effect.");
}

/// Handle config subcommand actions.
///
/// `path` overrides the default config location.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    path: Option<&Path>,
) -> Result<(), CliError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!();
            print!("{}", config.to_toml()?);
            println!();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!("Use 'glyphcam config show' to view current settings.");
                return Err(CliError::ConfigExists(config_path.display().to_string()));
            }
            Config::default().write(&config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::EffectArg;

    #[test]
    fn test_merge_prefers_cli_values() {
        let mut config = Config::default();
        config.render.detail = 10;
        config.render.width = 300;

        let args = RenderArgs {
            detail: Some(90),
            effect: Some(EffectArg::Shapes),
            ..RenderArgs::default()
        };
        let req = merge_request(&args, &config);
        assert_eq!(req.detail, 90);
        assert_eq!(req.effect, Effect::Shapes);
        // Not given on the command line: config wins
        assert_eq!(req.output_width_px, 300);
    }

    #[test]
    fn test_test_pattern_source() {
        let args = RenderArgs {
            test_pattern: true,
            ..RenderArgs::default()
        };
        let img = load_source(&args).unwrap();
        assert_eq!((img.width(), img.height()), TEST_PATTERN_SIZE);
    }

    #[test]
    fn test_missing_image_reports_path() {
        let args = RenderArgs {
            image: Some("/nonexistent/photo.png".into()),
            ..RenderArgs::default()
        };
        let err = load_source(&args).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/photo.png"));
    }

    #[test]
    fn test_png_without_font_is_rejected() {
        let args = RenderArgs {
            test_pattern: true,
            png: Some("/tmp/out.png".into()),
            frames: 1,
            ..RenderArgs::default()
        };
        let err = run_render(&args, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::PngWithoutFont));
    }

    #[test]
    fn test_config_init_writes_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        handle_config_action(ConfigAction::Init, &Config::default(), Some(&path)).unwrap();
        let written = Config::load_from_explicit(&path).unwrap();
        assert_eq!(written, Config::default());

        let err =
            handle_config_action(ConfigAction::Init, &Config::default(), Some(&path)).unwrap_err();
        assert!(matches!(err, CliError::ConfigExists(_)));
    }
}
