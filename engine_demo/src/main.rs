//! Demo application
//!
//! Opens the engine window with the stock Dear ImGui demo panel. Settings
//! come from `engine.toml` (or the path given as the first argument) when
//! the file exists.

use std::path::PathBuf;

use vulkan_engine::core::config::log_level_filter;
use vulkan_engine::foundation::logging;
use vulkan_engine::prelude::*;

const DEFAULT_CONFIG_PATH: &str = "engine.toml";

/// Demo window plus a little bookkeeping
struct DemoApp {
    demo: DemoWindow,
}

impl DemoApp {
    fn new(config: &EngineConfig) -> Self {
        Self {
            demo: DemoWindow::new(config.ui.clear_color),
        }
    }
}

impl Application for DemoApp {
    fn start(&mut self, core: &mut Core) -> Result<(), AppError> {
        log::info!(
            "Demo started: {}x{}, validation {}, {} UI texture slot(s)",
            core.config().window.width,
            core.config().window.height,
            if core.instance().validation_enabled() { "on" } else { "off" },
            core.descriptor_pool().max_sets()
        );
        Ok(())
    }

    fn update(&mut self, _core: &mut Core, tick: u32) -> Result<(), AppError> {
        if tick > 0 && tick % 10_000 == 0 {
            log::debug!("tick {tick}, counter {}", self.demo.counter);
        }
        Ok(())
    }

    fn ui(&mut self, ui: &imgui::Ui, frame: &FrameInfo) -> UiAction {
        self.demo.build(ui, frame.fps)
    }

    fn clear_color(&self) -> Option<[f32; 4]> {
        Some(self.demo.clear_color)
    }
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = EngineConfig::load_or_default(&path)?;
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), EngineError> {
    let config = load_config()?;
    logging::init(log_level_filter(&config.log_level).unwrap_or(log::LevelFilter::Info));

    log::info!("Starting {}", config.window.title);
    let mut app = DemoApp::new(&config);
    let mut core = Core::new(config)?;
    core.run(&mut app)
}

fn main() {
    if let Err(e) = run() {
        // Logging may not be up yet if the config failed to load
        logging::init(log::LevelFilter::Error);
        log::error!("{e}");
        std::process::exit(1);
    }
}
