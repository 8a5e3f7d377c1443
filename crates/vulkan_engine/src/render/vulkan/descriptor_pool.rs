//! Descriptor pool for UI textures

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Descriptor pool wrapper with RAII cleanup
///
/// Sized for a single combined image sampler, which is what a texture shown
/// in the UI needs. Sets can be freed individually.
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Device,
    max_sets: u32,
}

impl DescriptorPool {
    /// Pool sizes used by [`DescriptorPool::new`]
    pub fn pool_sizes(max_sets: u32) -> [vk::DescriptorPoolSize; 1] {
        [vk::DescriptorPoolSize::builder()
            .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(max_sets)
            .build()]
    }

    /// Create a pool holding `max_sets` combined image samplers
    pub fn new(device: Device, max_sets: u32) -> VulkanResult<Self> {
        if max_sets == 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "Descriptor pool needs room for at least one set".to_string(),
            });
        }

        let pool_sizes = Self::pool_sizes(max_sets);
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(max_sets)
            .pool_sizes(&pool_sizes);

        // SAFETY: `pool_sizes` outlives the call
        let pool = unsafe { device.create_descriptor_pool(&pool_info, None) }
            .map_err(VulkanError::Api)?;

        log::debug!("Created descriptor pool ({max_sets} set(s))");

        Ok(Self { pool, device, max_sets })
    }

    /// Get the pool handle
    pub const fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    /// Capacity in sets
    pub const fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        // SAFETY: every set allocated from the pool is released with it
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_sizes_are_image_samplers() {
        let sizes = DescriptorPool::pool_sizes(1);
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0].ty, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(sizes[0].descriptor_count, 1);
    }

    #[test]
    fn test_pool_sizes_scale_with_sets() {
        assert_eq!(DescriptorPool::pool_sizes(3)[0].descriptor_count, 3);
    }
}
