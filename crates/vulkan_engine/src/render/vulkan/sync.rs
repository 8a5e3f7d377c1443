//! Vulkan synchronization primitives
//!
//! RAII wrappers for semaphores and fences, plus the semaphore pair each
//! presentation slot uses.

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// GPU-GPU synchronization primitive with automatic resource management
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create a new binary semaphore
    pub fn new(device: Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();

        // SAFETY: `device` is live
        let semaphore = unsafe { device.create_semaphore(&create_info, None) }
            .map_err(VulkanError::Api)?;

        Ok(Self { device, semaphore })
    }

    /// Get the semaphore handle
    pub const fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        // SAFETY: owners wait for the device to go idle before dropping frame resources
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence wrapper with RAII cleanup
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a new fence
    pub fn new(device: Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::builder().flags(flags);

        // SAFETY: `device` is live
        let fence = unsafe { device.create_fence(&create_info, None) }
            .map_err(VulkanError::Api)?;

        Ok(Self { device, fence })
    }

    /// Wait for fence
    pub fn wait(&self, timeout: u64) -> VulkanResult<()> {
        // SAFETY: the fence belongs to `self.device`
        unsafe { self.device.wait_for_fences(&[self.fence], true, timeout) }
            .map_err(VulkanError::Api)
    }

    /// Reset fence
    pub fn reset(&self) -> VulkanResult<()> {
        // SAFETY: the fence is not part of a pending submission once waited on
        unsafe { self.device.reset_fences(&[self.fence]) }
            .map_err(VulkanError::Api)
    }

    /// Get the fence handle
    pub const fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        // SAFETY: owners wait for the device to go idle, so no submission signals this fence
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Semaphores for one presentation slot
pub struct FrameSemaphores {
    /// Signaled when the acquired swapchain image is ready to render into
    pub image_acquired: Semaphore,
    /// Signaled when rendering finished and the image may be presented
    pub render_complete: Semaphore,
}

impl FrameSemaphores {
    /// Create both semaphores
    pub fn new(device: &Device) -> VulkanResult<Self> {
        Ok(Self {
            image_acquired: Semaphore::new(device.clone())?,
            render_complete: Semaphore::new(device.clone())?,
        })
    }
}
