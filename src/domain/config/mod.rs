//! Configuration domain

pub mod app_config;

pub use app_config::{
    is_valid_frame_rate, AppConfig, MAX_FRAME_RATE, MIN_FRAME_RATE, VALID_LOG_LEVELS,
};
