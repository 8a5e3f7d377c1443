//! Vulkan backend
//!
//! Instance and device bring-up, the window surface and swapchain, and the
//! per-frame resources used to present.

pub mod commands;
pub mod descriptor_pool;
pub mod device;
pub mod framebuffer;
pub mod instance;
pub mod present_target;
pub mod render_pass;
pub mod result;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use descriptor_pool::DescriptorPool;
pub use device::{LogicalDevice, PhysicalDeviceInfo};
pub use instance::VulkanInstance;
pub use present_target::PresentTarget;
pub use result::{check_vk_result, is_swapchain_stale, VulkanError, VulkanResult};
pub use surface::Surface;
