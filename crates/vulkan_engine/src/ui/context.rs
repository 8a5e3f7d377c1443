//! ImGui context setup

use std::path::{Path, PathBuf};

use imgui::{ConfigFlags, FontConfig, FontGlyphRanges, FontSource};

use crate::core::config::UiConfig;

/// Owned imgui context configured from [`UiConfig`]
pub struct UiContext {
    context: imgui::Context,
}

impl UiContext {
    /// Create the context: ini file, navigation flags, style, fonts
    pub fn new(config: &UiConfig) -> Self {
        let mut context = imgui::Context::create();
        context.set_ini_filename(config.ini_file.as_ref().map(PathBuf::from));
        context.set_platform_name(Some(format!("vulkan_engine-glfw {}", env!("CARGO_PKG_VERSION"))));

        let io = context.io_mut();
        if config.keyboard_nav {
            io.config_flags |= ConfigFlags::NAV_ENABLE_KEYBOARD;
        }
        if config.gamepad_nav {
            io.config_flags |= ConfigFlags::NAV_ENABLE_GAMEPAD;
        }

        if config.dark_style {
            context.style_mut().use_dark_colors();
        } else {
            context.style_mut().use_light_colors();
        }

        Self::load_fonts(&mut context, config);

        Self { context }
    }

    fn load_fonts(context: &mut imgui::Context, config: &UiConfig) {
        let font_config = FontConfig {
            size_pixels: config.font_size,
            glyph_ranges: glyph_ranges(config.cyrillic_glyphs),
            ..FontConfig::default()
        };

        let ttf = config.font_path.as_deref().and_then(|path| read_font(Path::new(path)));
        match ttf {
            Some(data) => {
                context.fonts().add_font(&[FontSource::TtfData {
                    data: &data,
                    size_pixels: config.font_size,
                    config: Some(font_config),
                }]);
            }
            None => {
                context.fonts().add_font(&[FontSource::DefaultFontData {
                    config: Some(font_config),
                }]);
            }
        }
    }

    /// Borrow the imgui context
    pub const fn context(&self) -> &imgui::Context {
        &self.context
    }

    /// Mutably borrow the imgui context
    pub fn context_mut(&mut self) -> &mut imgui::Context {
        &mut self.context
    }

    /// Mutably borrow imgui IO
    pub fn io_mut(&mut self) -> &mut imgui::Io {
        self.context.io_mut()
    }
}

/// Glyph ranges to bake into the font atlas
pub fn glyph_ranges(cyrillic: bool) -> FontGlyphRanges {
    if cyrillic {
        FontGlyphRanges::cyrillic()
    } else {
        FontGlyphRanges::default()
    }
}

fn read_font(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(data) => {
            log::info!("Loaded UI font {}", path.display());
            Some(data)
        }
        Err(e) => {
            log::warn!("Cannot read font {}: {e}; using the built-in font", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_falls_back() {
        assert!(read_font(Path::new("/nonexistent/arial.ttf")).is_none());
    }

    #[test]
    fn test_readable_font_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("vulkan_engine_font_{}.ttf", std::process::id()));
        std::fs::write(&path, [0u8, 1, 0, 0]).unwrap();
        assert_eq!(read_font(&path), Some(vec![0u8, 1, 0, 0]));
        std::fs::remove_file(&path).unwrap();
    }
}
