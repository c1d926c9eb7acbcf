//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: ffmpeg capture,
//! file export, notification fan-out and config storage.

pub mod capture;
pub mod config;
pub mod export;
pub mod notification;

// Re-export adapters
pub use capture::{FfmpegCapture, FfmpegCaptureSession};
pub use config::XdgConfigStore;
pub use export::FileArtifactStore;
pub use notification::BroadcastNotifier;
