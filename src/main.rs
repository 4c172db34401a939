use clap::Parser;

use glyphcam::cli::{handle_config_action, list_effects, run_render, Args, Command};
use glyphcam::config::Config;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    // Load config file
    // If --config is specified, require the file to exist
    // Otherwise, fall back to defaults if default config not found
    let cfg = if let Some(ref path) = args.config {
        match Config::load_from_explicit(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match Config::load() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Config::default()
            }
        }
    };

    let result = match args.command {
        Command::Render(render) => run_render(&render, &cfg),
        Command::Effects => {
            list_effects();
            Ok(())
        }
        Command::Config { action } => handle_config_action(action, &cfg, args.config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
