//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::config::{AppConfig, MAX_FRAME_RATE, MIN_FRAME_RATE};
use crate::domain::recording::Command;

/// Screen recorder - capture the screen and microphone to WebM
#[derive(Parser, Debug)]
#[command(name = "screen-recorder")]
#[command(version)]
#[command(about = "Record the screen and microphone to WebM, controlled over a local socket")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory recordings are saved into
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// X11 display to capture (e.g., :0.0)
    #[arg(long, value_name = "DISPLAY")]
    pub display: Option<String>,

    /// PulseAudio source used as the microphone
    #[arg(short = 'a', long, value_name = "DEVICE")]
    pub audio_device: Option<String>,

    /// Capture frame rate
    #[arg(
        short = 'r',
        long,
        value_name = "FPS",
        value_parser = clap::value_parser!(u32).range(MIN_FRAME_RATE as i64..=MAX_FRAME_RATE as i64)
    )]
    pub frame_rate: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config values given on the command line
    pub fn config_overrides(&self) -> AppConfig {
        AppConfig {
            output_dir: self.output_dir.clone(),
            display: self.display.clone(),
            audio_device: self.audio_device.clone(),
            frame_rate: self.frame_rate,
            log_level: None,
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a command to the running recorder
    Ctl {
        #[command(subcommand)]
        action: CtlAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Recorder control actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtlAction {
    /// Start recording, or stop the running recording
    StartOrStop,
    /// Pause the running recording, or resume a paused one
    PauseOrResume,
    /// Show the recorder state
    Status,
    /// Save the last finished recording
    Save,
    /// Print state notifications as they happen
    Watch,
}

impl CtlAction {
    /// Request line sent over the control socket
    pub const fn request(&self) -> &'static str {
        match self {
            Self::StartOrStop => Command::StartOrStop.as_str(),
            Self::PauseOrResume => Command::PauseOrResume.as_str(),
            Self::Status => "status",
            Self::Save => "save",
            Self::Watch => "watch",
        }
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Resolved options for running the recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderOptions {
    pub output_dir: PathBuf,
    pub display: String,
    pub audio_device: String,
    pub frame_rate: u32,
}

impl RecorderOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            output_dir: config.output_dir_or_default(),
            display: config.display_or_default().to_string(),
            audio_device: config.audio_device_or_default().to_string(),
            frame_rate: config.frame_rate_or_default(),
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "output_dir",
    "display",
    "audio_device",
    "frame_rate",
    "log_level",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
