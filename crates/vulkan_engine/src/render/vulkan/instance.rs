//! Vulkan instance creation
//!
//! Loads the Vulkan library, enables the extensions the window system needs
//! plus a couple of optional ones, and installs a validation messenger that
//! routes driver messages through `log`.

use std::ffi::{c_char, CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Khronos validation layer
pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";
/// Extended physical device queries
pub const GET_PHYSICAL_DEVICE_PROPERTIES_2: &str = "VK_KHR_get_physical_device_properties2";
/// Lists non-conformant (portability) implementations such as MoltenVK
pub const PORTABILITY_ENUMERATION: &str = "VK_KHR_portability_enumeration";
/// Debug messenger extension
pub const DEBUG_UTILS: &str = "VK_EXT_debug_utils";

/// Convert a fixed-size, NUL-terminated Vulkan name field to `&str`
pub fn vk_name(raw: &[c_char]) -> &str {
    // SAFETY: Vulkan guarantees name fields are NUL-terminated within their array
    let name = unsafe { CStr::from_ptr(raw.as_ptr()) };
    name.to_str().unwrap_or_default()
}

/// Check whether `extension` is in `properties`
pub fn is_extension_available(properties: &[vk::ExtensionProperties], extension: &str) -> bool {
    properties
        .iter()
        .any(|property| vk_name(&property.extension_name) == extension)
}

/// Instance extensions and flags derived from what the loader offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceExtensionPlan {
    /// Extension names to enable, without duplicates
    pub extensions: Vec<String>,
    /// Instance creation flags
    pub flags: vk::InstanceCreateFlags,
}

impl InstanceExtensionPlan {
    /// Build the extension list from the window requirements and the
    /// extensions the loader reports
    pub fn new(
        required: &[String],
        available: &[vk::ExtensionProperties],
        enable_debug_utils: bool,
    ) -> Self {
        let mut plan = Self {
            extensions: Vec::with_capacity(required.len() + 3),
            flags: vk::InstanceCreateFlags::empty(),
        };

        for extension in required {
            plan.push(extension);
        }

        if is_extension_available(available, GET_PHYSICAL_DEVICE_PROPERTIES_2) {
            plan.push(GET_PHYSICAL_DEVICE_PROPERTIES_2);
        }

        if is_extension_available(available, PORTABILITY_ENUMERATION) {
            plan.push(PORTABILITY_ENUMERATION);
            plan.flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        }

        if enable_debug_utils {
            plan.push(DEBUG_UTILS);
        }

        plan
    }

    fn push(&mut self, extension: &str) {
        if !self.extensions.iter().any(|existing| existing == extension) {
            self.extensions.push(extension.to_string());
        }
    }
}

fn to_cstrings(names: &[String]) -> VulkanResult<Vec<CString>> {
    names
        .iter()
        .map(|name| {
            CString::new(name.as_str()).map_err(|_| {
                VulkanError::InitializationFailed(format!("Invalid name with interior NUL: {name}"))
            })
        })
        .collect()
}

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create a new Vulkan instance
    ///
    /// `required_extensions` normally comes from the window system.
    pub fn new(
        app_name: &str,
        required_extensions: &[String],
        enable_validation: bool,
    ) -> VulkanResult<Self> {
        // SAFETY: loading the system Vulkan library has no preconditions
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::Loader(e.to_string()))?;

        let available = entry
            .enumerate_instance_extension_properties(None)
            .map_err(VulkanError::Api)?;

        let validation = enable_validation && Self::validation_layer_present(&entry)?;
        if enable_validation && !validation {
            log::warn!("{VALIDATION_LAYER} requested but not installed, continuing without it");
        }

        let plan = InstanceExtensionPlan::new(required_extensions, &available, validation);
        log::debug!("Instance extensions: {:?}", plan.extensions);

        let extension_names = to_cstrings(&plan.extensions)?;
        let extension_ptrs: Vec<*const c_char> = extension_names.iter().map(|name| name.as_ptr()).collect();

        let layer_names = if validation {
            to_cstrings(&[VALIDATION_LAYER.to_string()])?
        } else {
            Vec::new()
        };
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("Application name contains NUL".to_string()))?;
        let engine_name_cstr = CString::new("VulkanEngine")
            .map_err(|_| VulkanError::InitializationFailed("Engine name contains NUL".to_string()))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let create_info = vk::InstanceCreateInfo::builder()
            .flags(plan.flags)
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        // SAFETY: every pointer in `create_info` borrows locals that outlive this call
        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(VulkanError::Api)?;

        let debug = if validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    // SAFETY: nothing else has been created from this instance yet
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::info!("Vulkan instance created (validation: {validation})");

        Ok(Self {
            entry,
            instance,
            debug,
        })
    }

    fn validation_layer_present(entry: &Entry) -> VulkanResult<bool> {
        let layers = entry
            .enumerate_instance_layer_properties()
            .map_err(VulkanError::Api)?;
        Ok(layers.iter().any(|layer| vk_name(&layer.layer_name) == VALIDATION_LAYER))
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        // SAFETY: the callback is a plain function with 'static lifetime
        unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
            .map_err(VulkanError::Api)
    }

    /// Raw instance handle
    pub fn handle(&self) -> vk::Instance {
        self.instance.handle()
    }

    /// Whether the validation messenger is installed
    pub const fn validation_enabled(&self) -> bool {
        self.debug.is_some()
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        // SAFETY: the owner drops every child object before the instance
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(name: &str) -> vk::ExtensionProperties {
        let mut property = vk::ExtensionProperties::default();
        for (dst, src) in property.extension_name.iter_mut().zip(name.bytes()) {
            *dst = src as c_char;
        }
        property
    }

    #[test]
    fn test_extension_lookup() {
        let available = [property("VK_KHR_surface"), property(PORTABILITY_ENUMERATION)];
        assert!(is_extension_available(&available, "VK_KHR_surface"));
        assert!(is_extension_available(&available, PORTABILITY_ENUMERATION));
        assert!(!is_extension_available(&available, "VK_KHR_surface2"));
        assert!(!is_extension_available(&[], "VK_KHR_surface"));
    }

    #[test]
    fn test_plan_adds_optional_extensions_when_available() {
        let required = vec!["VK_KHR_surface".to_string(), "VK_KHR_xcb_surface".to_string()];
        let available = [
            property("VK_KHR_surface"),
            property(GET_PHYSICAL_DEVICE_PROPERTIES_2),
            property(PORTABILITY_ENUMERATION),
        ];
        let plan = InstanceExtensionPlan::new(&required, &available, false);
        assert_eq!(
            plan.extensions,
            vec![
                "VK_KHR_surface".to_string(),
                "VK_KHR_xcb_surface".to_string(),
                GET_PHYSICAL_DEVICE_PROPERTIES_2.to_string(),
                PORTABILITY_ENUMERATION.to_string(),
            ]
        );
        assert!(plan.flags.contains(vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR));
    }

    #[test]
    fn test_plan_without_portability_keeps_flags_empty() {
        let required = vec!["VK_KHR_surface".to_string()];
        let plan = InstanceExtensionPlan::new(&required, &[property("VK_KHR_surface")], true);
        assert_eq!(plan.extensions, vec!["VK_KHR_surface".to_string(), DEBUG_UTILS.to_string()]);
        assert!(plan.flags.is_empty());
    }

    #[test]
    fn test_plan_deduplicates() {
        let required = vec![
            GET_PHYSICAL_DEVICE_PROPERTIES_2.to_string(),
            GET_PHYSICAL_DEVICE_PROPERTIES_2.to_string(),
        ];
        let plan = InstanceExtensionPlan::new(&required, &[property(GET_PHYSICAL_DEVICE_PROPERTIES_2)], false);
        assert_eq!(plan.extensions, vec![GET_PHYSICAL_DEVICE_PROPERTIES_2.to_string()]);
    }
}
