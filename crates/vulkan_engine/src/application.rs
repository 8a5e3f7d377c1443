//! Application trait and lifecycle management

use std::time::Duration;

use thiserror::Error;

use crate::engine::{Core, EngineError};

/// Application lifecycle trait
///
/// Implement this trait to put logic and UI on top of the engine. Every
/// method has a do-nothing default.
pub trait Application {
    /// Called once after the engine is initialized, before the first frame
    fn start(&mut self, core: &mut Core) -> Result<(), AppError> {
        let _ = core;
        Ok(())
    }

    /// Called once per loop iteration, before the UI is built
    ///
    /// # Arguments
    /// * `core` - The running engine
    /// * `tick` - Iteration counter, wrapping on overflow
    fn update(&mut self, core: &mut Core, tick: u32) -> Result<(), AppError> {
        let _ = (core, tick);
        Ok(())
    }

    /// Build this frame's UI
    fn ui(&mut self, ui: &imgui::Ui, frame: &FrameInfo) -> UiAction {
        let _ = (ui, frame);
        UiAction::Continue
    }

    /// Background color for this frame; `None` keeps the configured one
    fn clear_color(&self) -> Option<[f32; 4]> {
        None
    }
}

/// Per-frame values handed to [`Application::ui`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Loop iteration counter
    pub tick: u32,
    /// Time since the previous frame
    pub delta: Duration,
    /// Smoothed frames per second
    pub fps: f32,
}

/// What the engine should do after a UI pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiAction {
    /// Keep running
    #[default]
    Continue,
    /// Leave the main loop and shut down
    Exit,
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
