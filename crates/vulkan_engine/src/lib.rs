//! # Vulkan Engine
//!
//! A minimal desktop bootstrap: a GLFW window, a Vulkan instance and device,
//! and Dear ImGui wired to both, driven by a single-threaded render loop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vulkan_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn ui(&mut self, ui: &imgui::Ui, _frame: &FrameInfo) -> UiAction {
//!         ui.window("Hello").build(|| ui.text("Hello, world"));
//!         UiAction::Continue
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut core = Core::new(config)?;
//!     core.run(&mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod ui;

mod application;
mod engine;

pub use imgui;

pub use application::{AppError, Application, FrameInfo, UiAction};
pub use engine::{Core, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, Application, FrameInfo, UiAction,
        Core, EngineError,
        config::{Config, ConfigError},
        core::config::{EngineConfig, WindowConfig, VulkanConfig, UiConfig},
        foundation::time::Timer,
        ui::DemoWindow,
        imgui,
    };
}
