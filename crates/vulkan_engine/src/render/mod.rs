//! Rendering: the GLFW window and the Vulkan backend behind it

pub mod vulkan;
pub mod window;

pub use window::{Window, WindowError, WindowResult};
