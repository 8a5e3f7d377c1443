//! # Engine Configuration
//!
//! All settings the bootstrap reads at startup: the window, the Vulkan
//! instance and presentation policy, and the UI layer.
//!
//! Every section has `#[serde(default)]`, so a config file only needs the
//! keys it wants to override:
//!
//! ```toml
//! log_level = "debug"
//!
//! [window]
//! title = "My Tool"
//!
//! [vulkan]
//! lock_fps = false
//! ```

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial window width in screen coordinates
    pub width: u32,
    /// Initial window height in screen coordinates
    pub height: u32,
    /// Whether the user can resize the window
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Engine".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
        }
    }
}

/// # Vulkan Configuration
///
/// Instance metadata, validation and presentation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulkanConfig {
    /// Application name reported to the driver
    pub application_name: String,
    /// Whether to enable the Khronos validation layer
    ///
    /// `None` enables it in debug builds only.
    pub enable_validation: Option<bool>,
    /// Prefer low-latency present modes (mailbox, then immediate) over FIFO
    pub lock_fps: bool,
    /// Minimum number of swapchain images to request
    pub min_image_count: u32,
}

impl VulkanConfig {
    /// Resolve the validation setting for the current build
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self {
            application_name: "Vulkan Engine".to_string(),
            enable_validation: None,
            lock_fps: true,
            min_image_count: 2,
        }
    }
}

/// # UI Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// TrueType font to load instead of the built-in font
    pub font_path: Option<String>,
    /// Font size in pixels
    pub font_size: f32,
    /// Include Cyrillic glyphs when loading `font_path`
    pub cyrillic_glyphs: bool,
    /// Dark color scheme (light otherwise)
    pub dark_style: bool,
    /// Keyboard navigation
    pub keyboard_nav: bool,
    /// Gamepad navigation
    pub gamepad_nav: bool,
    /// Initial clear color (RGBA, not premultiplied)
    pub clear_color: [f32; 4],
    /// Where Dear ImGui persists window layout, `None` disables it
    pub ini_file: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 15.0,
            cyrillic_glyphs: true,
            dark_style: true,
            keyboard_nav: true,
            gamepad_nav: true,
            clear_color: [0.45, 0.55, 0.60, 1.00],
            ini_file: None,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration handed to [`crate::Core::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Vulkan settings
    pub vulkan: VulkanConfig,
    /// UI settings
    pub ui: UiConfig,
}

impl EngineConfig {
    /// Set the window title and the Vulkan application name together
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.vulkan.application_name.clone_from(&title);
        self.window.title = title;
        self
    }

    /// Set the initial window size
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable or disable validation layers
    pub const fn with_validation(mut self, enabled: bool) -> Self {
        self.vulkan.enable_validation = Some(enabled);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.title.is_empty() {
            return Err(ConfigError::Invalid("Window title cannot be empty".to_string()));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if self.vulkan.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }

        if self.vulkan.min_image_count < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_image_count must be at least 2, got {}",
                self.vulkan.min_image_count
            )));
        }

        if self.ui.font_size.is_nan() || self.ui.font_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Font size must be positive, got {}",
                self.ui.font_size
            )));
        }

        if self.ui.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(format!(
                "Clear color components must be in [0, 1], got {:?}",
                self.ui.clear_color
            )));
        }

        if log_level_filter(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!("Unknown log level: {}", self.log_level)));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            vulkan: VulkanConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

/// Parse a log level name (`"off"`, `"error"` .. `"trace"`), case-insensitive
pub fn log_level_filter(level: &str) -> Option<log::LevelFilter> {
    level.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.vulkan.min_image_count, 2);
        assert!(config.vulkan.lock_fps);
        assert_eq!(config.ui.clear_color, [0.45, 0.55, 0.60, 1.00]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            log_level = "debug"

            [window]
            title = "Tool"

            [vulkan]
            lock_fps = false
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.window.title, "Tool");
        assert_eq!(config.window.width, 1280);
        assert!(!config.vulkan.lock_fps);
        assert_eq!(config.vulkan.min_image_count, 2);
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn test_builder_sets_title_everywhere() {
        let config = EngineConfig::default().with_title("Demo").with_size(640, 480);
        assert_eq!(config.window.title, "Demo");
        assert_eq!(config.vulkan.application_name, "Demo");
        assert_eq!((config.window.width, config.window.height), (640, 480));
    }

    #[test]
    fn test_rejects_zero_size() {
        let config = EngineConfig::default().with_size(0, 600);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_single_image_swapchain() {
        let mut config = EngineConfig::default();
        config.vulkan.min_image_count = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_font_and_color() {
        let mut config = EngineConfig::default();
        config.ui.font_size = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.ui.font_size = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.ui.clear_color = [1.5, 0.0, 0.0, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let config = EngineConfig::default().with_log_level("loud");
        assert!(config.validate().is_err());
        assert_eq!(log_level_filter("WARN"), Some(log::LevelFilter::Warn));
    }

    #[test]
    fn test_explicit_validation_overrides_build_default() {
        assert!(EngineConfig::default().with_validation(true).vulkan.validation_enabled());
        assert!(!EngineConfig::default().with_validation(false).vulkan.validation_enabled());
    }

    #[test]
    fn test_shipped_engine_toml_is_valid() {
        let config: EngineConfig = toml::from_str(include_str!("../../../../engine.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, EngineConfig::default());
    }
}
