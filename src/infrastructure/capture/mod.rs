//! Screen and microphone capture through ffmpeg

mod ffmpeg;
mod session;

pub use ffmpeg::{
    build_audio_source_args, build_encoder_args, build_video_source_args, FfmpegCapture,
};
pub use session::FfmpegCaptureSession;
