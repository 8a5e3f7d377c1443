//! ImGui draw data recording
//!
//! Thin owner around `imgui_rs_vulkan_renderer`, which brings its own
//! pipeline, font texture and per-frame vertex buffers.

use ash::{vk, Instance};
use imgui_rs_vulkan_renderer::{Options, Renderer};

use crate::render::vulkan::commands::CommandPool;
use crate::render::vulkan::device::{LogicalDevice, PhysicalDeviceInfo};
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Records imgui draw data into the present render pass
pub struct UiRenderer {
    // Dropped before the upload pool it borrowed at creation
    renderer: Renderer,
    upload_pool: CommandPool,
    queue: vk::Queue,
}

impl UiRenderer {
    /// Build the renderer for `render_pass` and upload the font atlas
    pub fn new(
        instance: &Instance,
        physical_device: &PhysicalDeviceInfo,
        device: &LogicalDevice,
        render_pass: vk::RenderPass,
        in_flight_frames: usize,
        imgui: &mut imgui::Context,
    ) -> VulkanResult<Self> {
        let upload_pool = CommandPool::new(
            device.device.clone(),
            device.queue_family,
            vk::CommandPoolCreateFlags::TRANSIENT,
        )?;

        let renderer = Renderer::with_default_allocator(
            instance,
            physical_device.device,
            device.device.clone(),
            device.queue,
            upload_pool.handle(),
            render_pass,
            imgui,
            Some(Options {
                in_flight_frames: in_flight_frames.max(1),
                ..Default::default()
            }),
        )
        .map_err(|e| VulkanError::Ui(e.to_string()))?;

        log::debug!("UI renderer ready ({in_flight_frames} frames in flight)");

        Ok(Self {
            renderer,
            upload_pool,
            queue: device.queue,
        })
    }

    /// Record `draw_data` into a command buffer inside the render pass
    pub fn cmd_draw(&mut self, command_buffer: vk::CommandBuffer, draw_data: &imgui::DrawData) -> VulkanResult<()> {
        self.renderer
            .cmd_draw(command_buffer, draw_data)
            .map_err(|e| VulkanError::Ui(e.to_string()))
    }

    /// Re-upload the font atlas after fonts were added to `imgui`
    pub fn reload_fonts(&mut self, imgui: &mut imgui::Context) -> VulkanResult<()> {
        self.renderer
            .update_fonts_texture(self.queue, self.upload_pool.handle(), imgui)
            .map_err(|e| VulkanError::Ui(e.to_string()))
    }
}
