//! Window surface management
//!
//! Owns the `VkSurfaceKHR` and answers the questions swapchain creation asks
//! about it: can the queue present, which format and which present mode.

use ash::extensions::khr;
use ash::{vk, Entry, Instance};

use crate::foundation::logging::Severity;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Formats tried in order when choosing the swapchain format
pub const REQUESTED_SURFACE_FORMATS: [vk::Format; 4] = [
    vk::Format::B8G8R8A8_UNORM,
    vk::Format::R8G8B8A8_UNORM,
    vk::Format::B8G8R8_UNORM,
    vk::Format::R8G8B8_UNORM,
];

/// Color space paired with [`REQUESTED_SURFACE_FORMATS`]
pub const REQUESTED_COLOR_SPACE: vk::ColorSpaceKHR = vk::ColorSpaceKHR::SRGB_NONLINEAR;

/// Present modes tried in order
///
/// With `lock_fps` the lowest-latency available mode wins; otherwise
/// presentation is vsynced.
pub fn requested_present_modes(lock_fps: bool) -> &'static [vk::PresentModeKHR] {
    if lock_fps {
        &[
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::FIFO,
        ]
    } else {
        &[vk::PresentModeKHR::FIFO]
    }
}

/// Choose a surface format
///
/// A surface reporting a single `UNDEFINED` format accepts anything, so the
/// first request is used as is. Otherwise requests are tried in order and
/// the first available format is the fallback.
pub fn select_surface_format(
    available: &[vk::SurfaceFormatKHR],
    requested: &[vk::Format],
    color_space: vk::ColorSpaceKHR,
) -> Option<vk::SurfaceFormatKHR> {
    let first = *available.first()?;

    if available.len() == 1 && first.format == vk::Format::UNDEFINED {
        return Some(vk::SurfaceFormatKHR {
            format: requested.first().copied().unwrap_or(vk::Format::B8G8R8A8_UNORM),
            color_space,
        });
    }

    requested
        .iter()
        .find_map(|&format| {
            available
                .iter()
                .find(|candidate| candidate.format == format && candidate.color_space == color_space)
                .copied()
        })
        .or(Some(first))
}

/// Choose a present mode, falling back to FIFO which every device supports
pub fn select_present_mode(
    available: &[vk::PresentModeKHR],
    requested: &[vk::PresentModeKHR],
) -> vk::PresentModeKHR {
    requested
        .iter()
        .copied()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Smallest useful swapchain length for a present mode
pub fn min_image_count_for_present_mode(mode: vk::PresentModeKHR) -> u32 {
    match mode {
        vk::PresentModeKHR::MAILBOX => 3,
        vk::PresentModeKHR::FIFO | vk::PresentModeKHR::FIFO_RELAXED => 2,
        _ => 1,
    }
}

/// Vulkan surface wrapper for presentation
pub struct Surface {
    surface_loader: khr::Surface,
    surface: vk::SurfaceKHR,
}

impl Surface {
    /// Take ownership of a surface created by the window system
    pub fn new(entry: &Entry, instance: &Instance, surface: vk::SurfaceKHR) -> Self {
        Self {
            surface_loader: khr::Surface::new(entry, instance),
            surface,
        }
    }

    /// Get the underlying surface handle
    pub const fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Fail unless `queue_family` can present to this surface
    pub fn ensure_supported(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> VulkanResult<()> {
        // SAFETY: surface and device come from the same instance
        let supported = unsafe {
            self.surface_loader
                .get_physical_device_surface_support(physical_device, queue_family, self.surface)
        }
        .map_err(VulkanError::Api)?;

        if supported {
            Ok(())
        } else {
            Severity::Critical.report("device not support WSI");
            Err(VulkanError::SurfaceNotSupported)
        }
    }

    /// Get surface capabilities for a physical device
    pub fn capabilities(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        // SAFETY: surface and device come from the same instance
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
        }
        .map_err(VulkanError::Api)
    }

    /// Get surface formats for a physical device
    pub fn formats(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        // SAFETY: surface and device come from the same instance
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)
        }
        .map_err(VulkanError::Api)
    }

    /// Get surface present modes for a physical device
    pub fn present_modes(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        // SAFETY: surface and device come from the same instance
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
        }
        .map_err(VulkanError::Api)
    }

    /// Pick the swapchain format from [`REQUESTED_SURFACE_FORMATS`]
    pub fn select_format(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<vk::SurfaceFormatKHR> {
        let formats = self.formats(physical_device)?;
        select_surface_format(&formats, &REQUESTED_SURFACE_FORMATS, REQUESTED_COLOR_SPACE).ok_or_else(|| {
            VulkanError::InitializationFailed("Surface reports no formats".to_string())
        })
    }

    /// Pick the present mode for the given latency policy
    pub fn select_present_mode(&self, physical_device: vk::PhysicalDevice, lock_fps: bool) -> VulkanResult<vk::PresentModeKHR> {
        let modes = self.present_modes(physical_device)?;
        Ok(select_present_mode(&modes, requested_present_modes(lock_fps)))
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: the swapchain built on this surface is destroyed first
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_undefined_surface_takes_first_request() {
        let chosen = select_surface_format(
            &[format(vk::Format::UNDEFINED)],
            &REQUESTED_SURFACE_FORMATS,
            REQUESTED_COLOR_SPACE,
        )
        .unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(chosen.color_space, REQUESTED_COLOR_SPACE);
    }

    #[test]
    fn test_request_order_beats_availability_order() {
        let available = [format(vk::Format::R8G8B8A8_UNORM), format(vk::Format::B8G8R8A8_UNORM)];
        let chosen = select_surface_format(&available, &REQUESTED_SURFACE_FORMATS, REQUESTED_COLOR_SPACE).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn test_color_space_must_match() {
        let available = [
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT,
            },
            format(vk::Format::R8G8B8A8_UNORM),
        ];
        let chosen = select_surface_format(&available, &REQUESTED_SURFACE_FORMATS, REQUESTED_COLOR_SPACE).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_falls_back_to_first_available() {
        let available = [format(vk::Format::A2B10G10R10_UNORM_PACK32), format(vk::Format::R16G16B16A16_SFLOAT)];
        let chosen = select_surface_format(&available, &REQUESTED_SURFACE_FORMATS, REQUESTED_COLOR_SPACE).unwrap();
        assert_eq!(chosen.format, vk::Format::A2B10G10R10_UNORM_PACK32);
    }

    #[test]
    fn test_no_formats() {
        assert!(select_surface_format(&[], &REQUESTED_SURFACE_FORMATS, REQUESTED_COLOR_SPACE).is_none());
    }

    #[test]
    fn test_present_mode_follows_request_order() {
        let available = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(
            select_present_mode(&available, requested_present_modes(true)),
            vk::PresentModeKHR::IMMEDIATE
        );
        let available = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];
        assert_eq!(
            select_present_mode(&available, requested_present_modes(true)),
            vk::PresentModeKHR::MAILBOX
        );
    }

    #[test]
    fn test_vsync_policy_uses_fifo() {
        let available = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];
        assert_eq!(
            select_present_mode(&available, requested_present_modes(false)),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn test_present_mode_fallback_is_fifo() {
        assert_eq!(
            select_present_mode(&[vk::PresentModeKHR::FIFO_RELAXED], &[vk::PresentModeKHR::MAILBOX]),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn test_min_image_count_per_mode() {
        assert_eq!(min_image_count_for_present_mode(vk::PresentModeKHR::MAILBOX), 3);
        assert_eq!(min_image_count_for_present_mode(vk::PresentModeKHR::FIFO), 2);
        assert_eq!(min_image_count_for_present_mode(vk::PresentModeKHR::FIFO_RELAXED), 2);
        assert_eq!(min_image_count_for_present_mode(vk::PresentModeKHR::IMMEDIATE), 1);
    }
}
