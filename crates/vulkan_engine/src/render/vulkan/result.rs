//! Vulkan error types and result checking

use ash::vk;
use thiserror::Error;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// The Vulkan loader library could not be found or opened
    #[error("Failed to load Vulkan: {0}")]
    Loader(String),

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No physical device was enumerated
    #[error("No Vulkan-capable GPU found")]
    NoSuitableDevice,

    /// The selected GPU has no queue family with graphics support
    #[error("No graphics queue family found")]
    NoGraphicsQueue,

    /// The graphics queue family cannot present to the window surface
    #[error("Device does not support WSI presentation")]
    SurfaceNotSupported,

    /// Window system failure during surface creation
    #[error("Window error: {0}")]
    Window(String),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// The UI renderer failed
    #[error("UI renderer error: {0}")]
    Ui(String),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

impl From<vk::Result> for VulkanError {
    fn from(result: vk::Result) -> Self {
        Self::Api(result)
    }
}

impl From<crate::render::window::WindowError> for VulkanError {
    fn from(error: crate::render::window::WindowError) -> Self {
        Self::Window(error.to_string())
    }
}

/// Check a raw Vulkan status code
///
/// `SUCCESS` passes silently. Positive status codes (`NOT_READY`,
/// `SUBOPTIMAL_KHR`, ...) are logged and tolerated. Negative codes are
/// errors.
pub fn check_vk_result(result: vk::Result) -> VulkanResult<()> {
    if result == vk::Result::SUCCESS {
        return Ok(());
    }

    log::error!("Vulkan error: {result:?}");
    if result.as_raw() < 0 {
        return Err(VulkanError::Api(result));
    }
    Ok(())
}

/// Whether a result means the swapchain no longer matches the surface
pub fn is_swapchain_stale(result: vk::Result) -> bool {
    result == vk::Result::ERROR_OUT_OF_DATE_KHR || result == vk::Result::SUBOPTIMAL_KHR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes() {
        assert!(check_vk_result(vk::Result::SUCCESS).is_ok());
    }

    #[test]
    fn test_positive_status_is_tolerated() {
        assert!(check_vk_result(vk::Result::NOT_READY).is_ok());
        assert!(check_vk_result(vk::Result::SUBOPTIMAL_KHR).is_ok());
    }

    #[test]
    fn test_negative_code_is_error() {
        let err = check_vk_result(vk::Result::ERROR_DEVICE_LOST).unwrap_err();
        assert!(matches!(err, VulkanError::Api(vk::Result::ERROR_DEVICE_LOST)));
    }

    #[test]
    fn test_stale_swapchain_detection() {
        assert!(is_swapchain_stale(vk::Result::ERROR_OUT_OF_DATE_KHR));
        assert!(is_swapchain_stale(vk::Result::SUBOPTIMAL_KHR));
        assert!(!is_swapchain_stale(vk::Result::ERROR_SURFACE_LOST_KHR));
        assert!(!is_swapchain_stale(vk::Result::SUCCESS));
    }
}
