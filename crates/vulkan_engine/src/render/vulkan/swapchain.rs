//! Vulkan swapchain management
//!
//! Handles swapchain creation and recreation following RAII principles

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Choose the swapchain extent
///
/// The surface dictates the extent unless it reports `u32::MAX`, in which
/// case the requested size is used, clamped to the allowed range.
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if caps.current_extent.width == u32::MAX {
        vk::Extent2D {
            width: width.clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: height.clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    } else {
        caps.current_extent
    }
}

/// Choose the number of swapchain images to request
///
/// At least `min_image_count` and the surface minimum, capped at the surface
/// maximum when it has one.
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR, min_image_count: u32) -> u32 {
    let count = min_image_count.max(caps.min_image_count);
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

/// Parameters for building a swapchain
#[derive(Debug, Clone, Copy)]
pub struct SwapchainDesc {
    /// Target surface
    pub surface: vk::SurfaceKHR,
    /// Surface capabilities queried just before creation
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Image format and color space
    pub format: vk::SurfaceFormatKHR,
    /// Presentation mode
    pub present_mode: vk::PresentModeKHR,
    /// Requested framebuffer size
    pub width: u32,
    /// Requested framebuffer size
    pub height: u32,
    /// Lower bound on the image count
    pub min_image_count: u32,
}

/// Swapchain management wrapper with RAII cleanup
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain, retiring `old` if given
    ///
    /// The retired swapchain must still be destroyed by its owner.
    pub fn new(
        instance: &Instance,
        device: Device,
        desc: &SwapchainDesc,
        old: Option<&Self>,
    ) -> VulkanResult<Self> {
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        let extent = choose_extent(&desc.capabilities, desc.width, desc.height);
        let image_count = choose_image_count(&desc.capabilities, desc.min_image_count);

        let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(desc.surface)
            .min_image_count(image_count)
            .image_format(desc.format.format)
            .image_color_space(desc.format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(desc.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(desc.present_mode)
            .clipped(true)
            .old_swapchain(old.map_or_else(vk::SwapchainKHR::null, Self::handle));

        // SAFETY: the surface and the retired swapchain belong to this device's instance
        let swapchain = unsafe { swapchain_loader.create_swapchain(&swapchain_create_info, None) }
            .map_err(VulkanError::Api)?;

        // SAFETY: `swapchain` was just created
        let images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                // SAFETY: no views exist yet
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(VulkanError::Api(e));
            }
        };

        let mut this = Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views: Vec::new(),
            format: desc.format,
            extent,
        };

        // Views are pushed one by one so Drop cleans up a partial set on failure
        for index in 0..this.images.len() {
            let view = this.create_image_view(this.images[index])?;
            this.image_views.push(view);
        }

        log::debug!(
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            this.images.len(),
            desc.format.format,
            desc.present_mode
        );

        Ok(this)
    }

    fn create_image_view(&self, image: vk::Image) -> VulkanResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(self.format.format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::R,
                g: vk::ComponentSwizzle::G,
                b: vk::ComponentSwizzle::B,
                a: vk::ComponentSwizzle::A,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        // SAFETY: `image` belongs to this swapchain
        unsafe { self.device.create_image_view(&create_info, None) }.map_err(VulkanError::Api)
    }

    /// Acquire the next image, signaling `semaphore` when it is ready
    ///
    /// Returns the image index and whether the swapchain is suboptimal.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<(u32, bool), vk::Result> {
        // SAFETY: the semaphore is unsignaled and owned by the caller
        unsafe {
            self.swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
        }
    }

    /// Queue `image_index` for presentation after `wait_semaphore`
    ///
    /// Returns whether the swapchain is suboptimal.
    pub fn present(&self, queue: vk::Queue, wait_semaphore: vk::Semaphore, image_index: u32) -> Result<bool, vk::Result> {
        let wait_semaphores = [wait_semaphore];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        // SAFETY: arrays outlive the call; the queue supports presentation
        unsafe { self.swapchain_loader.queue_present(queue, &present_info) }
    }

    /// Get swapchain extent
    pub const fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Get image views
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Get swapchain handle
    pub const fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        // SAFETY: the owner waits for the device to go idle before dropping
        unsafe {
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(current: (u32, u32), min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: current.0, height: current.1 },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            min_image_count: min_count,
            max_image_count: max_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_surface_extent_wins() {
        let extent = choose_extent(&caps((800, 600), 2, 8), 1280, 720);
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn test_undefined_extent_uses_request_clamped() {
        let extent = choose_extent(&caps((u32::MAX, u32::MAX), 2, 8), 1280, 10_000);
        assert_eq!((extent.width, extent.height), (1280, 4096));
    }

    #[test]
    fn test_image_count_respects_surface_minimum() {
        assert_eq!(choose_image_count(&caps((1, 1), 3, 8), 2), 3);
        assert_eq!(choose_image_count(&caps((1, 1), 1, 8), 2), 2);
    }

    #[test]
    fn test_image_count_capped_by_maximum() {
        assert_eq!(choose_image_count(&caps((1, 1), 1, 2), 3), 2);
    }

    #[test]
    fn test_zero_maximum_means_unbounded() {
        assert_eq!(choose_image_count(&caps((1, 1), 2, 0), 5), 5);
    }
}
