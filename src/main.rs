mod annotation;
mod app;
mod color;
mod config;
mod data;
mod image_source;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::SolarBoardApp;
use clap::Parser;
use config::{Config, Overrides};
use eframe::egui;
use state::AppState;

/// Solar dataset dashboard with an image annotation tool.
#[derive(Parser, Debug)]
#[command(name = "solar-board", version, about)]
struct Cli {
    /// Config file (defaults to the per-user config, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset file (.csv, .json, .parquet); the bundled solar dataset otherwise
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Image to annotate (.png, .jpg); a generated sample otherwise
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Column whose values populate the dropdown
    #[arg(short, long)]
    grouping_field: Option<String>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug")
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            dataset: self.dataset.clone(),
            image: self.image.clone(),
            grouping_field: self.grouping_field.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = Config::resolve(cli.config.as_deref())?;
    config.apply_overrides(cli.overrides());

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    match &source {
        Some(path) => log::info!("Loaded config from {}", path.display()),
        None => log::info!("Using default config"),
    }

    let state = AppState::from_config(&config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Solar Board",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render png/jpg/etc.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(SolarBoardApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
