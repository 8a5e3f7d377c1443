//! Physical device selection and logical device creation

use std::ffi::{c_char, CString};

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};

use crate::render::vulkan::instance::{is_extension_available, vk_name};
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Exposes differences between a layered implementation and native Vulkan
pub const PORTABILITY_SUBSET: &str = "VK_KHR_portability_subset";

/// Pick a device index: the first discrete GPU, else the first device
pub fn pick_device_index(device_types: &[vk::PhysicalDeviceType]) -> Option<usize> {
    device_types
        .iter()
        .position(|&ty| ty == vk::PhysicalDeviceType::DISCRETE_GPU)
        .or_else(|| (!device_types.is_empty()).then_some(0))
}

/// Pick the first queue family that supports graphics
pub fn pick_graphics_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .and_then(|index| u32::try_from(index).ok())
}

/// Device extensions to enable given what the device offers
pub fn device_extensions(available: &[vk::ExtensionProperties]) -> Vec<String> {
    let mut extensions = vec![swapchain_extension_name()];
    if is_extension_available(available, PORTABILITY_SUBSET) {
        extensions.push(PORTABILITY_SUBSET.to_string());
    }
    extensions
}

fn swapchain_extension_name() -> String {
    SwapchainLoader::name().to_string_lossy().into_owned()
}

/// Selected physical device and its capabilities
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Index of the graphics queue family
    pub graphics_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select a GPU, preferring discrete ones, and its graphics queue family
    pub fn select(instance: &Instance) -> VulkanResult<Self> {
        // SAFETY: `instance` is a live instance
        let devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(VulkanError::Api)?;

        let properties: Vec<vk::PhysicalDeviceProperties> = devices
            .iter()
            // SAFETY: handles come straight from enumeration
            .map(|&device| unsafe { instance.get_physical_device_properties(device) })
            .collect();
        let types: Vec<vk::PhysicalDeviceType> = properties.iter().map(|p| p.device_type).collect();

        let index = pick_device_index(&types).ok_or(VulkanError::NoSuitableDevice)?;
        let device = devices[index];
        let properties = properties[index];

        // SAFETY: `device` was enumerated from `instance`
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        let graphics_family = pick_graphics_family(&families).ok_or(VulkanError::NoGraphicsQueue)?;

        log::info!(
            "Selected GPU: {} ({:?}), graphics queue family {}",
            vk_name(&properties.device_name),
            properties.device_type,
            graphics_family
        );

        Ok(Self {
            device,
            properties,
            graphics_family,
        })
    }

    /// Device name as reported by the driver
    pub fn name(&self) -> &str {
        vk_name(&self.properties.device_name)
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// The single graphics + present queue
    pub queue: vk::Queue,
    /// Index of the queue family `queue` belongs to
    pub queue_family: u32,
}

impl LogicalDevice {
    /// Create a device with one graphics queue and the swapchain extension
    pub fn new(instance: &Instance, physical_device: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        // SAFETY: the physical device belongs to `instance`
        let available = unsafe { instance.enumerate_device_extension_properties(physical_device.device) }
            .map_err(VulkanError::Api)?;

        let extension_names: Vec<CString> = device_extensions(&available)
            .into_iter()
            .map(|name| {
                CString::new(name)
                    .map_err(|_| VulkanError::InitializationFailed("Invalid device extension name".to_string()))
            })
            .collect::<VulkanResult<_>>()?;
        let extension_ptrs: Vec<*const c_char> = extension_names.iter().map(|name| name.as_ptr()).collect();

        let priorities = [1.0_f32];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical_device.graphics_family)
            .queue_priorities(&priorities)
            .build()];

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs);

        // SAFETY: every pointer in `create_info` borrows locals that outlive this call
        let device = unsafe { instance.create_device(physical_device.device, &create_info, None) }
            .map_err(VulkanError::Api)?;

        // SAFETY: exactly one queue was requested from this family
        let queue = unsafe { device.get_device_queue(physical_device.graphics_family, 0) };

        Ok(Self {
            device,
            queue,
            queue_family: physical_device.graphics_family,
        })
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        // SAFETY: the device is alive for as long as `self`
        unsafe { self.device.device_wait_idle() }.map_err(VulkanError::Api)
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        // SAFETY: the owner destroys every object created from this device first
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                log::error!("Failed to wait for device idle before destroying it: {e:?}");
            }
            self.device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn property(name: &str) -> vk::ExtensionProperties {
        let mut property = vk::ExtensionProperties::default();
        for (dst, src) in property.extension_name.iter_mut().zip(name.bytes()) {
            *dst = src as c_char;
        }
        property
    }

    #[test]
    fn test_prefers_discrete_gpu() {
        let types = [
            vk::PhysicalDeviceType::INTEGRATED_GPU,
            vk::PhysicalDeviceType::CPU,
            vk::PhysicalDeviceType::DISCRETE_GPU,
        ];
        assert_eq!(pick_device_index(&types), Some(2));
    }

    #[test]
    fn test_falls_back_to_first_device() {
        let types = [vk::PhysicalDeviceType::INTEGRATED_GPU, vk::PhysicalDeviceType::VIRTUAL_GPU];
        assert_eq!(pick_device_index(&types), Some(0));
    }

    #[test]
    fn test_no_devices() {
        assert_eq!(pick_device_index(&[]), None);
    }

    #[test]
    fn test_first_graphics_family_wins() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        assert_eq!(pick_graphics_family(&families), Some(1));
    }

    #[test]
    fn test_compute_only_device_has_no_graphics_family() {
        let families = [family(vk::QueueFlags::COMPUTE), family(vk::QueueFlags::TRANSFER)];
        assert_eq!(pick_graphics_family(&families), None);
    }

    #[test]
    fn test_device_extensions() {
        assert_eq!(device_extensions(&[]), vec!["VK_KHR_swapchain".to_string()]);
        assert_eq!(
            device_extensions(&[property(PORTABILITY_SUBSET)]),
            vec!["VK_KHR_swapchain".to_string(), PORTABILITY_SUBSET.to_string()]
        );
    }
}
