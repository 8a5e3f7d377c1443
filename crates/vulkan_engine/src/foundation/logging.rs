//! Logging utilities and structured logging support

use std::sync::Once;

pub use log::{debug, info, warn, error, trace};

static INIT: Once = Once::new();

/// Initialize the logging system
///
/// `RUST_LOG` wins over `default_level`. Only the first call has an effect.
pub fn init(default_level: log::LevelFilter) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(default_level);
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        if builder.try_init().is_err() {
            log::debug!("Logger already installed by the host");
        }
    });
}

/// Severity of a message reported by the graphics layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational
    Info,
    /// Something looks wrong but rendering continues
    Warning,
    /// An operation failed
    Error,
    /// The engine cannot continue
    Critical,
}

impl Severity {
    /// Map a numeric level (0 = info .. 3 = critical)
    pub const fn from_level(level: i32) -> Option<Self> {
        match level {
            0 => Some(Self::Info),
            1 => Some(Self::Warning),
            2 => Some(Self::Error),
            3 => Some(Self::Critical),
            _ => None,
        }
    }

    /// `log` level used when reporting at this severity
    pub const fn log_level(self) -> log::Level {
        match self {
            Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error | Self::Critical => log::Level::Error,
        }
    }

    /// Human-readable prefix for report lines
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Info => "Vulkan info",
            Self::Warning => "Vulkan warning",
            Self::Error => "Vulkan error",
            Self::Critical => "Vulkan critical error",
        }
    }

    /// Format a report line for `description`
    pub fn format(self, description: &str) -> String {
        format!("{}: {}.", self.prefix(), description)
    }

    /// Log `description` at this severity
    pub fn report(self, description: &str) {
        log::log!(self.log_level(), "{}", self.format(description));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(Severity::from_level(0), Some(Severity::Info));
        assert_eq!(Severity::from_level(1), Some(Severity::Warning));
        assert_eq!(Severity::from_level(2), Some(Severity::Error));
        assert_eq!(Severity::from_level(3), Some(Severity::Critical));
        assert_eq!(Severity::from_level(4), None);
        assert_eq!(Severity::from_level(-1), None);
    }

    #[test]
    fn test_critical_logs_as_error() {
        assert_eq!(Severity::Critical.log_level(), log::Level::Error);
        assert_eq!(Severity::Warning.log_level(), log::Level::Warn);
    }

    #[test]
    fn test_report_format() {
        assert_eq!(
            Severity::Critical.format("device not support WSI"),
            "Vulkan critical error: device not support WSI."
        );
        assert_eq!(Severity::Info.format("ready"), "Vulkan info: ready.");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(log::LevelFilter::Warn);
        init(log::LevelFilter::Trace);
        Severity::Info.report("logging initialized");
    }
}
