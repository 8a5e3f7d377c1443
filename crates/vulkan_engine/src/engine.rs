//! Core engine implementation
//!
//! [`Core`] owns the window, the Vulkan objects and the UI, in that order of
//! creation, and tears them down in reverse.

use thiserror::Error;

use crate::{
    application::{Application, FrameInfo, UiAction},
    config::ConfigError,
    core::config::{log_level_filter, EngineConfig},
    foundation::{logging, time::Timer},
    render::{
        vulkan::{
            DescriptorPool, LogicalDevice, PhysicalDeviceInfo, PresentTarget, Surface, VulkanError,
            VulkanInstance,
        },
        Window, WindowError,
    },
    ui::{GlfwPlatform, UiContext, UiRenderer},
};

/// Descriptor sets reserved for UI textures
const UI_DESCRIPTOR_SETS: u32 = 1;

/// Main engine struct
///
/// Field order is teardown order: everything that references the device is
/// dropped before it, and the surface before the instance and window.
pub struct Core {
    ui_renderer: UiRenderer,
    ui: UiContext,
    platform: GlfwPlatform,
    present_target: PresentTarget,
    descriptor_pool: DescriptorPool,
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    instance: VulkanInstance,
    window: Window,

    timer: Timer,
    config: EngineConfig,
    tick: u32,
    running: bool,
}

impl Core {
    /// Create the window, Vulkan context and UI
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        logging::init(log_level_filter(&config.log_level).unwrap_or(log::LevelFilter::Info));
        log::info!("Initializing engine...");

        let mut window = Window::new(&config.window)?;
        let extensions = window.required_instance_extensions()?;

        let instance = VulkanInstance::new(
            &config.vulkan.application_name,
            &extensions,
            config.vulkan.validation_enabled(),
        )?;
        let physical_device = PhysicalDeviceInfo::select(&instance.instance)?;
        let device = LogicalDevice::new(&instance.instance, &physical_device)?;
        let descriptor_pool = DescriptorPool::new(device.device.clone(), UI_DESCRIPTOR_SETS)?;

        let raw_surface = window.create_surface(instance.handle())?;
        let surface = Surface::new(&instance.entry, &instance.instance, raw_surface);
        let present_target = PresentTarget::new(
            &instance.instance,
            &physical_device,
            &device,
            surface,
            &config.vulkan,
            window.framebuffer_size(),
        )?;

        let mut ui = UiContext::new(&config.ui);
        let ui_renderer = UiRenderer::new(
            &instance.instance,
            &physical_device,
            &device,
            present_target.render_pass(),
            present_target.image_count(),
            ui.context_mut(),
        )?;

        log::info!("Engine initialized on {}", physical_device.name());

        Ok(Self {
            ui_renderer,
            ui,
            platform: GlfwPlatform::new(),
            present_target,
            descriptor_pool,
            device,
            physical_device,
            instance,
            window,
            timer: Timer::new(),
            config,
            tick: 0,
            running: false,
        })
    }

    /// Run the main loop until the window closes or the application exits
    pub fn run<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        app.start(self)
            .map_err(|e| EngineError::Application(format!("App start: {e}")))?;

        log::info!("Starting main loop...");
        self.running = true;

        while self.running && !self.window.should_close() {
            self.window.poll_events();
            self.dispatch_events();

            let tick = self.tick;
            app.update(self, tick)
                .map_err(|e| EngineError::Application(format!("App update: {e}")))?;
            self.tick = self.tick.wrapping_add(1);
            self.timer.update();

            let framebuffer_size = self.window.framebuffer_size();
            if self.present_target.needs_resize(framebuffer_size) {
                log::debug!("Resizing swapchain to {}x{}", framebuffer_size.0, framebuffer_size.1);
                self.present_target.create_or_resize(
                    framebuffer_size.0,
                    framebuffer_size.1,
                    self.config.vulkan.min_image_count,
                )?;
            }

            if self.render_frame(app, tick)? == UiAction::Exit {
                log::info!("Exit requested from UI");
                self.running = false;
            }
        }

        self.device.wait_idle()?;
        log::info!("Engine shutdown complete");
        Ok(())
    }

    fn dispatch_events(&mut self) {
        for (_, event) in self.window.flush_events() {
            self.platform.handle_event(self.ui.io_mut(), &event);
        }
    }

    fn render_frame<A: Application>(&mut self, app: &mut A, tick: u32) -> Result<UiAction, EngineError> {
        let frame = FrameInfo {
            tick,
            delta: self.timer.delta(),
            fps: self.timer.fps(),
        };

        self.platform
            .prepare_frame(self.ui.io_mut(), &self.window, self.timer.ui_delta());
        let ui = self.ui.context_mut().new_frame();
        let action = app.ui(ui, &frame);
        let clear_color = app.clear_color().unwrap_or(self.config.ui.clear_color);
        let draw_data = self.ui.context_mut().render();

        if action == UiAction::Exit {
            return Ok(action);
        }

        let minimized = draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0;
        if !minimized {
            self.present_target.set_clear_color(clear_color);
            let renderer = &mut self.ui_renderer;
            self.present_target
                .frame_render(|command_buffer| renderer.cmd_draw(command_buffer, draw_data))?;
            self.present_target.frame_present()?;
        }

        Ok(action)
    }

    /// Request engine shutdown after the current frame
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Engine configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The GLFW window
    pub const fn window(&self) -> &Window {
        &self.window
    }

    /// Mutable access to the GLFW window
    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    /// The Vulkan instance
    pub const fn instance(&self) -> &VulkanInstance {
        &self.instance
    }

    /// The selected GPU
    pub const fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// The logical device and its graphics queue
    pub const fn device(&self) -> &LogicalDevice {
        &self.device
    }

    /// Pool for UI texture descriptor sets
    pub const fn descriptor_pool(&self) -> &DescriptorPool {
        &self.descriptor_pool
    }

    /// Swapchain and frame state
    pub fn present_target_mut(&mut self) -> &mut PresentTarget {
        &mut self.present_target
    }

    /// The imgui context
    pub fn ui_context_mut(&mut self) -> &mut UiContext {
        &mut self.ui
    }

    /// Re-upload the font atlas after fonts were added at runtime
    pub fn reload_fonts(&mut self) -> Result<(), EngineError> {
        self.ui_renderer.reload_fonts(self.ui.context_mut())?;
        Ok(())
    }

    /// Frame timing
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Iterations run so far
    pub const fn tick(&self) -> u32 {
        self.tick
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        // The UI renderer's buffers may still be in use by the last frame
        if let Err(e) = self.device.wait_idle() {
            log::error!("Failed to wait for device idle during shutdown: {e}");
        }
        log::debug!("Tearing down engine");
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Window system failure
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Vulkan or UI renderer failure
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] VulkanError),

    /// Error returned by the application
    #[error("Application error: {0}")]
    Application(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_descriptor_pool_reserves_one_sampler() {
        let sizes = DescriptorPool::pool_sizes(UI_DESCRIPTOR_SETS);
        assert_eq!(sizes[0].ty, ash::vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(sizes[0].descriptor_count, UI_DESCRIPTOR_SETS);
    }
}
