//! Capture port interfaces: device acquisition and capture-and-encode sessions

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::AcquisitionError;
use crate::domain::media::{
    AudioConstraints, AudioTrack, CaptureSettings, MediaStream, VideoConstraints, VideoTrack,
};
use crate::domain::recording::Fragment;

/// Capture session errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Failed to pause capture: {0}")]
    PauseFailed(String),

    #[error("Failed to resume capture: {0}")]
    ResumeFailed(String),

    #[error("Failed to stop capture: {0}")]
    StopFailed(String),

    #[error("FFmpeg not found. Please install FFmpeg.")]
    FfmpegNotFound,
}

/// Port for requesting capture devices from the environment
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request a screen video source satisfying `constraints`
    async fn request_video(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<VideoTrack, AcquisitionError>;

    /// Request a microphone source
    async fn request_audio(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<AudioTrack, AcquisitionError>;
}

/// Port for starting capture-and-encode sessions on an acquired stream
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Start encoding `stream`. Fragments are emitted every
    /// `settings.fragment_interval` while the session is running.
    async fn start(
        &self,
        stream: &MediaStream,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureSession>, CaptureError>;
}

/// A running capture-and-encode session
#[async_trait]
pub trait CaptureSession: Send {
    /// Wait for the next emitted fragment.
    ///
    /// Returns `None` once the session has ended and every fragment was handed
    /// out.
    async fn next_fragment(&mut self) -> Option<Fragment>;

    /// Suspend emission.
    ///
    /// Returns fragments emitted before the pause that were not picked up yet,
    /// so the caller can record them before leaving the recording state.
    async fn pause(&mut self) -> Result<Vec<Fragment>, CaptureError>;

    /// Continue emission after `pause`
    async fn resume(&mut self) -> Result<(), CaptureError>;

    /// Finish the session and return every fragment not handed out yet
    async fn stop(self: Box<Self>) -> Result<Vec<Fragment>, CaptureError>;
}
