//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default X11 display used for screen capture
pub const DEFAULT_DISPLAY: &str = ":0.0";
/// Default microphone device
pub const DEFAULT_AUDIO_DEVICE: &str = "default";
/// Default capture frame rate
pub const DEFAULT_FRAME_RATE: u32 = 30;
/// Lowest accepted capture frame rate
pub const MIN_FRAME_RATE: u32 = 1;
/// Highest accepted capture frame rate
pub const MAX_FRAME_RATE: u32 = 240;
/// Default diagnostic log level
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Valid values for `log_level`
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub output_dir: Option<String>,
    pub display: Option<String>,
    pub audio_device: Option<String>,
    pub frame_rate: Option<u32>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            output_dir: Some(default_output_dir().to_string_lossy().to_string()),
            display: Some(DEFAULT_DISPLAY.to_string()),
            audio_device: Some(DEFAULT_AUDIO_DEVICE.to_string()),
            frame_rate: Some(DEFAULT_FRAME_RATE),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output_dir: other.output_dir.or(self.output_dir),
            display: other.display.or(self.display),
            audio_device: other.audio_device.or(self.audio_device),
            frame_rate: other.frame_rate.or(self.frame_rate),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Get output directory, or the user's video directory if not set
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_output_dir)
    }

    /// Get display, or ":0.0" if not set
    pub fn display_or_default(&self) -> &str {
        self.display.as_deref().unwrap_or(DEFAULT_DISPLAY)
    }

    /// Get audio device, or "default" if not set
    pub fn audio_device_or_default(&self) -> &str {
        self.audio_device.as_deref().unwrap_or(DEFAULT_AUDIO_DEVICE)
    }

    /// Get frame rate, or 30 if not set or zero
    pub fn frame_rate_or_default(&self) -> u32 {
        self.frame_rate
            .filter(|rate| is_valid_frame_rate(*rate))
            .unwrap_or(DEFAULT_FRAME_RATE)
    }

    /// Get log level, or "warn" if not set
    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// The user's video directory, falling back to the current directory
/// Check a frame rate against the accepted range
pub fn is_valid_frame_rate(rate: u32) -> bool {
    (MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&rate)
}

fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
