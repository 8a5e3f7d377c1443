//! UI System Module
//!
//! Dear ImGui wired to the GLFW window and the Vulkan present pass.
//!
//! Architecture:
//! - context: imgui context setup (IO flags, style, fonts)
//! - platform: GLFW event forwarding and per-frame IO state
//! - renderer: draw data recording into the present pass
//! - demo: the stock demo window

pub mod context;
pub mod demo;
pub mod platform;
pub mod renderer;

pub use context::UiContext;
pub use demo::DemoWindow;
pub use platform::{GlfwPlatform, InputEvent};
pub use renderer::UiRenderer;
