//! Window presentation target
//!
//! Owns everything tied to the window surface: the swapchain, the render
//! pass drawing into it, and one set of per-image frame resources. Drives
//! the acquire → record → submit → present cycle and rebuilds itself when
//! the surface changes.

use ash::{vk, Device, Instance};

use crate::core::config::VulkanConfig;
use crate::render::vulkan::commands::{CommandPool, CommandRecorder};
use crate::render::vulkan::device::{LogicalDevice, PhysicalDeviceInfo};
use crate::render::vulkan::framebuffer::Framebuffer;
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::surface::{min_image_count_for_present_mode, Surface};
use crate::render::vulkan::swapchain::{Swapchain, SwapchainDesc};
use crate::render::vulkan::sync::{Fence, FrameSemaphores};
use crate::render::vulkan::{is_swapchain_stale, VulkanError, VulkanResult};

/// Premultiply an RGBA color by its alpha
pub fn premultiply(color: [f32; 4]) -> [f32; 4] {
    let [r, g, b, a] = color;
    [r * a, g * a, b * a, a]
}

/// Advance the semaphore ring by one slot
pub const fn next_semaphore_index(current: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (current + 1) % count
    }
}

/// Whether the swapchain must be rebuilt for a framebuffer of
/// `framebuffer` size, given the extent the swapchain was actually built with
///
/// A zero-area framebuffer (minimized window) never triggers a rebuild.
pub const fn needs_rebuild(framebuffer: (u32, u32), rebuild_requested: bool, swapchain_extent: (u32, u32)) -> bool {
    if framebuffer.0 == 0 || framebuffer.1 == 0 {
        return false;
    }
    rebuild_requested || framebuffer.0 != swapchain_extent.0 || framebuffer.1 != swapchain_extent.1
}

/// Position in the acquire/present cycle and the pending-rebuild flag
///
/// Swapchain results are folded in here so the frame loop's branching
/// stays independent of a live device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCursor {
    frame_index: u32,
    semaphore_index: usize,
    semaphore_count: usize,
    rebuild: bool,
}

impl FrameCursor {
    /// Start of a fresh swapchain with `semaphore_count` semaphore slots
    pub const fn new(semaphore_count: usize) -> Self {
        Self {
            frame_index: 0,
            semaphore_index: 0,
            semaphore_count,
            rebuild: false,
        }
    }

    /// Fold in the result of acquiring an image
    ///
    /// Returns the image to render into, or `None` when the swapchain is
    /// stale and the frame must be skipped.
    pub fn on_acquire(&mut self, result: Result<(u32, bool), vk::Result>) -> VulkanResult<Option<u32>> {
        match result {
            Ok((index, false)) => {
                self.frame_index = index;
                Ok(Some(index))
            }
            Ok((_, true)) => {
                self.rebuild = true;
                Ok(None)
            }
            Err(result) if is_swapchain_stale(result) => {
                self.rebuild = true;
                Ok(None)
            }
            Err(result) => Err(VulkanError::Api(result)),
        }
    }

    /// Whether the last rendered image should be presented
    pub const fn should_present(&self) -> bool {
        !self.rebuild
    }

    /// Fold in the result of presenting
    ///
    /// The semaphore ring only advances after a clean present.
    pub fn on_present(&mut self, result: Result<bool, vk::Result>) -> VulkanResult<()> {
        match result {
            Ok(false) => {
                self.semaphore_index = next_semaphore_index(self.semaphore_index, self.semaphore_count);
                Ok(())
            }
            Ok(true) => {
                self.rebuild = true;
                Ok(())
            }
            Err(result) if is_swapchain_stale(result) => {
                self.rebuild = true;
                Ok(())
            }
            Err(result) => Err(VulkanError::Api(result)),
        }
    }

    /// Flag a rebuild before the next frame
    pub fn request_rebuild(&mut self) {
        self.rebuild = true;
    }

    /// Whether a rebuild is pending
    pub const fn rebuild_requested(&self) -> bool {
        self.rebuild
    }

    /// Image acquired by the last successful [`Self::on_acquire`]
    pub const fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Current semaphore slot
    pub const fn semaphore_index(&self) -> usize {
        self.semaphore_index
    }
}

/// Resources for one swapchain image
struct Frame {
    command_pool: CommandPool,
    command_buffer: vk::CommandBuffer,
    fence: Fence,
    framebuffer: Framebuffer,
}

impl Frame {
    fn new(device: &Device, queue_family: u32, render_pass: vk::RenderPass, view: vk::ImageView, extent: vk::Extent2D) -> VulkanResult<Self> {
        let command_pool = CommandPool::new(device.clone(), queue_family, vk::CommandPoolCreateFlags::empty())?;
        let command_buffer = command_pool
            .allocate_command_buffers(1)?
            .into_iter()
            .next()
            .ok_or_else(|| VulkanError::InitializationFailed("No command buffer allocated".to_string()))?;

        Ok(Self {
            command_pool,
            command_buffer,
            fence: Fence::new(device.clone(), true)?,
            framebuffer: Framebuffer::new(device.clone(), render_pass, &[view], extent)?,
        })
    }
}

/// Per-image frames plus the semaphore ring (one spare pair so acquire never
/// reuses a semaphore still in flight)
fn build_frames(
    device: &Device,
    queue_family: u32,
    render_pass: vk::RenderPass,
    swapchain: &Swapchain,
) -> VulkanResult<(Vec<Frame>, Vec<FrameSemaphores>)> {
    let extent = swapchain.extent();
    let frames = swapchain
        .image_views()
        .iter()
        .map(|&view| Frame::new(device, queue_family, render_pass, view, extent))
        .collect::<VulkanResult<Vec<_>>>()?;
    let semaphores = (0..=frames.len())
        .map(|_| FrameSemaphores::new(device))
        .collect::<VulkanResult<Vec<_>>>()?;
    Ok((frames, semaphores))
}

/// Swapchain plus per-frame state for presenting to a window surface
pub struct PresentTarget {
    // Drop order matters: frame resources, then the pass, then the
    // swapchain, then the surface it was built on.
    frames: Vec<Frame>,
    semaphores: Vec<FrameSemaphores>,
    render_pass: RenderPass,
    swapchain: Swapchain,
    surface: Surface,

    instance: Instance,
    device: Device,
    physical_device: vk::PhysicalDevice,
    queue: vk::Queue,
    queue_family: u32,

    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    min_image_count: u32,

    cursor: FrameCursor,
    clear_value: vk::ClearValue,
}

impl PresentTarget {
    /// Build the swapchain and frame resources for `surface`
    pub fn new(
        instance: &Instance,
        physical_device: &PhysicalDeviceInfo,
        device: &LogicalDevice,
        surface: Surface,
        config: &VulkanConfig,
        framebuffer_size: (u32, u32),
    ) -> VulkanResult<Self> {
        surface.ensure_supported(physical_device.device, device.queue_family)?;

        let format = surface.select_format(physical_device.device)?;
        let present_mode = surface.select_present_mode(physical_device.device, config.lock_fps)?;
        let min_image_count = config.min_image_count.max(min_image_count_for_present_mode(present_mode));
        log::info!("Present mode {present_mode:?}, format {:?}", format.format);

        let desc = SwapchainDesc {
            surface: surface.handle(),
            capabilities: surface.capabilities(physical_device.device)?,
            format,
            present_mode,
            width: framebuffer_size.0,
            height: framebuffer_size.1,
            min_image_count,
        };
        let swapchain = Swapchain::new(instance, device.device.clone(), &desc, None)?;
        let render_pass = RenderPass::new_present_pass(device.device.clone(), format.format)?;
        let (frames, semaphores) = build_frames(&device.device, device.queue_family, render_pass.handle(), &swapchain)?;

        Ok(Self {
            cursor: FrameCursor::new(semaphores.len()),
            frames,
            semaphores,
            render_pass,
            swapchain,
            surface,
            instance: instance.clone(),
            device: device.device.clone(),
            physical_device: physical_device.device,
            queue: device.queue,
            queue_family: device.queue_family,
            format,
            present_mode,
            min_image_count,
            clear_value: vk::ClearValue::default(),
        })
    }

    /// Recreate the swapchain for a new framebuffer size
    ///
    /// The render pass survives: the surface format is fixed at creation.
    /// On failure the previous resources stay in place and a rebuild stays
    /// pending.
    pub fn create_or_resize(&mut self, width: u32, height: u32, min_image_count: u32) -> VulkanResult<()> {
        // SAFETY: nothing may be in flight while frame resources are replaced
        unsafe { self.device.device_wait_idle() }.map_err(VulkanError::Api)?;

        self.cursor.request_rebuild();
        let min_image_count = min_image_count.max(min_image_count_for_present_mode(self.present_mode));

        let desc = SwapchainDesc {
            surface: self.surface.handle(),
            capabilities: self.surface.capabilities(self.physical_device)?,
            format: self.format,
            present_mode: self.present_mode,
            width,
            height,
            min_image_count,
        };
        let swapchain = Swapchain::new(&self.instance, self.device.clone(), &desc, Some(&self.swapchain))?;
        let (frames, semaphores) = build_frames(&self.device, self.queue_family, self.render_pass.handle(), &swapchain)?;

        // Old framebuffers go before the old swapchain's image views
        self.frames = frames;
        self.semaphores = semaphores;
        self.swapchain = swapchain;

        self.min_image_count = min_image_count;
        self.cursor = FrameCursor::new(self.semaphores.len());
        Ok(())
    }

    /// Whether a framebuffer of this size calls for [`Self::create_or_resize`]
    pub const fn needs_resize(&self, framebuffer_size: (u32, u32)) -> bool {
        let extent = self.swapchain.extent();
        needs_rebuild(framebuffer_size, self.cursor.rebuild_requested(), (extent.width, extent.height))
    }

    fn semaphores(&self) -> VulkanResult<&FrameSemaphores> {
        let index = self.cursor.semaphore_index();
        self.semaphores.get(index).ok_or_else(|| VulkanError::InvalidOperation {
            reason: format!("Semaphore slot {index} out of {}", self.semaphores.len()),
        })
    }

    /// Acquire an image and record one frame into it
    ///
    /// `record` receives a command buffer inside the open render pass. If
    /// the swapchain is stale the frame is skipped and a rebuild is flagged.
    pub fn frame_render<F>(&mut self, record: F) -> VulkanResult<()>
    where
        F: FnOnce(vk::CommandBuffer) -> VulkanResult<()>,
    {
        let semaphores = self.semaphores()?;
        let image_acquired = semaphores.image_acquired.handle();
        let render_complete = semaphores.render_complete.handle();

        let acquired = self.swapchain.acquire_next_image(image_acquired);
        let Some(image_index) = self.cursor.on_acquire(acquired)? else {
            return Ok(());
        };

        let frame = self
            .frames
            .get(image_index as usize)
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!("Acquired image {image_index} has no frame"),
            })?;

        frame.fence.wait(u64::MAX)?;
        frame.command_pool.reset()?;

        let mut recorder = CommandRecorder::new(frame.command_buffer, self.device.clone());
        recorder.begin()?;
        {
            let render_area = vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.swapchain.extent(),
            };
            let pass = recorder.begin_render_pass(
                self.render_pass.handle(),
                frame.framebuffer.handle(),
                render_area,
                &[self.clear_value],
            )?;
            record(pass.command_buffer())?;
        }
        let command_buffer = recorder.end()?;

        let wait_semaphores = [image_acquired];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [render_complete];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        frame.fence.reset()?;
        // SAFETY: the command buffer is fully recorded and the fence is unsignaled
        unsafe {
            self.device
                .queue_submit(self.queue, &[submit_info.build()], frame.fence.handle())
        }
        .map_err(VulkanError::Api)
    }

    /// Present the image rendered by the last [`Self::frame_render`]
    pub fn frame_present(&mut self) -> VulkanResult<()> {
        if !self.cursor.should_present() {
            return Ok(());
        }

        let render_complete = self.semaphores()?.render_complete.handle();
        let presented = self
            .swapchain
            .present(self.queue, render_complete, self.cursor.frame_index());
        self.cursor.on_present(presented)
    }

    /// Set the color the render pass clears to
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_value = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: premultiply(color),
            },
        };
    }

    /// Request a rebuild before the next frame
    pub fn request_rebuild(&mut self) {
        self.cursor.request_rebuild();
    }

    /// Whether a rebuild is pending
    pub const fn rebuild_requested(&self) -> bool {
        self.cursor.rebuild_requested()
    }

    /// Render pass the UI renderer must draw with
    pub const fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }

    /// Current swapchain extent
    pub const fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Number of swapchain images, i.e. frames that may be in flight
    pub fn image_count(&self) -> usize {
        self.frames.len()
    }
}

impl Drop for PresentTarget {
    fn drop(&mut self) {
        // SAFETY: waiting idle has no preconditions
        if let Err(e) = unsafe { self.device.device_wait_idle() } {
            log::error!("Failed to wait for device idle during teardown: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_premultiply_scales_rgb_by_alpha() {
        let color = premultiply([0.5, 1.0, 0.2, 0.5]);
        assert_relative_eq!(color[0], 0.25);
        assert_relative_eq!(color[1], 0.5);
        assert_relative_eq!(color[2], 0.1);
        assert_relative_eq!(color[3], 0.5);
    }

    #[test]
    fn test_opaque_color_unchanged() {
        assert_eq!(premultiply([0.45, 0.55, 0.60, 1.0]), [0.45, 0.55, 0.60, 1.0]);
    }

    #[test]
    fn test_semaphore_index_wraps() {
        assert_eq!(next_semaphore_index(0, 3), 1);
        assert_eq!(next_semaphore_index(2, 3), 0);
        assert_eq!(next_semaphore_index(0, 0), 0);
    }

    #[test]
    fn test_minimized_never_rebuilds() {
        assert!(!needs_rebuild((0, 720), true, (1280, 720)));
        assert!(!needs_rebuild((1280, 0), true, (1280, 720)));
    }

    #[test]
    fn test_rebuild_when_created_extent_differs_from_framebuffer() {
        // Surface dictated 800x600 although 1280x720 was asked for
        assert!(needs_rebuild((1280, 720), false, (800, 600)));
        assert!(!needs_rebuild((800, 600), false, (800, 600)));
    }

    #[test]
    fn test_clean_acquire_returns_image() {
        let mut cursor = FrameCursor::new(4);
        assert_eq!(cursor.on_acquire(Ok((2, false))).unwrap(), Some(2));
        assert_eq!(cursor.frame_index(), 2);
        assert!(cursor.should_present());
    }

    #[test]
    fn test_suboptimal_acquire_skips_frame() {
        let mut cursor = FrameCursor::new(4);
        assert_eq!(cursor.on_acquire(Ok((1, true))).unwrap(), None);
        assert!(cursor.rebuild_requested());
        assert!(!cursor.should_present());
        assert_eq!(cursor.frame_index(), 0);
    }

    #[test]
    fn test_out_of_date_acquire_skips_frame() {
        let mut cursor = FrameCursor::new(4);
        assert_eq!(cursor.on_acquire(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(), None);
        assert!(!cursor.should_present());
    }

    #[test]
    fn test_failed_acquire_is_an_error() {
        let mut cursor = FrameCursor::new(4);
        assert!(matches!(
            cursor.on_acquire(Err(vk::Result::ERROR_DEVICE_LOST)),
            Err(VulkanError::Api(vk::Result::ERROR_DEVICE_LOST))
        ));
        assert!(!cursor.rebuild_requested());
    }

    #[test]
    fn test_clean_present_advances_ring() {
        let mut cursor = FrameCursor::new(3);
        cursor.on_present(Ok(false)).unwrap();
        cursor.on_present(Ok(false)).unwrap();
        assert_eq!(cursor.semaphore_index(), 2);
        cursor.on_present(Ok(false)).unwrap();
        assert_eq!(cursor.semaphore_index(), 0);
    }

    #[test]
    fn test_stale_present_keeps_ring_position() {
        let mut cursor = FrameCursor::new(3);
        cursor.on_present(Ok(false)).unwrap();
        cursor.on_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap();
        assert_eq!(cursor.semaphore_index(), 1);
        assert!(cursor.rebuild_requested());

        let mut cursor = FrameCursor::new(3);
        cursor.on_present(Ok(true)).unwrap();
        assert_eq!(cursor.semaphore_index(), 0);
        assert!(!cursor.should_present());
    }

    #[test]
    fn test_failed_present_is_an_error() {
        let mut cursor = FrameCursor::new(3);
        assert!(cursor.on_present(Err(vk::Result::ERROR_DEVICE_LOST)).is_err());
        assert_eq!(cursor.semaphore_index(), 0);
    }

    #[test]
    fn test_pending_rebuild_blocks_present_until_fresh_cursor() {
        let mut cursor = FrameCursor::new(3);
        cursor.request_rebuild();
        assert!(!cursor.should_present());
        assert!(cursor.rebuild_requested());
        assert!(FrameCursor::new(3).should_present());
    }

    #[test]
    fn test_rebuild_on_flag_or_size_change() {
        assert!(!needs_rebuild((1280, 720), false, (1280, 720)));
        assert!(needs_rebuild((1280, 720), true, (1280, 720)));
        assert!(needs_rebuild((1920, 1080), false, (1280, 720)));
    }
}
