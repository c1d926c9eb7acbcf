//! FFmpeg-based device probing and capture adapter

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};

use crate::application::ports::{CaptureError, CaptureSession, MediaDevices, MediaEncoder};
use crate::domain::error::AcquisitionError;
use crate::domain::media::{
    AudioConstraints, AudioTrack, CaptureSettings, MediaStream, VideoConstraints, VideoTrack,
};

use super::session::{Feed, FfmpegCaptureSession};

/// Screen grabbing input format
const VIDEO_INPUT_FORMAT: &str = "x11grab";
/// Microphone input format
const AUDIO_INPUT_FORMAT: &str = "pulse";

/// Raw frame layout between the screen grabber and the encoder
const RAW_PIXEL_FORMAT: &str = "yuv420p";
/// Raw sample layout between the microphone reader and the encoder
const RAW_SAMPLE_FORMAT: &str = "s16le";
const RAW_SAMPLE_RATE: u32 = 48_000;
const RAW_CHANNELS: u32 = 2;
/// 20 ms of interleaved 16-bit samples
const AUDIO_FEED_UNIT: usize = (RAW_SAMPLE_RATE / 50 * RAW_CHANNELS * 2) as usize;

/// Named pipe the encoder reads microphone samples from
const AUDIO_PIPE_NAME: &str = "microphone.pcm";

/// FFmpeg adapter: probes devices and spawns capture sessions
#[derive(Debug, Clone)]
pub struct FfmpegCapture {
    display: String,
    audio_device: String,
}

impl FfmpegCapture {
    /// Create a new adapter for an X11 display and a PulseAudio source
    pub fn new(display: impl Into<String>, audio_device: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            audio_device: audio_device.into(),
        }
    }

    /// Args grabbing a single frame, to check the screen is reachable
    fn build_video_probe_args(&self, track: &VideoTrack) -> Vec<String> {
        let mut args = quiet_args();
        args.extend(video_input_args(track));
        args.extend(["-frames:v", "1", "-f", "null", "-"].map(String::from));
        args
    }

    /// Args reading a tenth of a second, to check the microphone is reachable
    fn build_audio_probe_args(track: &AudioTrack) -> Vec<String> {
        let mut args = quiet_args();
        args.extend(audio_input_args(track));
        args.extend(["-t", "0.1", "-f", "null", "-"].map(String::from));
        args
    }

    /// Run a short-lived ffmpeg probe, returning the last error line on failure
    async fn probe(args: Vec<String>) -> Result<(), String> {
        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    "ffmpeg not found".to_string()
                } else {
                    e.to_string()
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(stderr
                .lines()
                .last()
                .unwrap_or("ffmpeg exited with non-zero status")
                .to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl MediaDevices for FfmpegCapture {
    async fn request_video(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<VideoTrack, AcquisitionError> {
        let track = VideoTrack {
            input_format: VIDEO_INPUT_FORMAT.to_string(),
            device: self.display.clone(),
            width: constraints.width,
            height: constraints.ideal_height(),
            frame_rate: constraints.frame_rate,
        };

        tracing::debug!(display = %track.device, "probing screen capture");
        Self::probe(self.build_video_probe_args(&track))
            .await
            .map_err(|e| AcquisitionError::video(e))?;
        Ok(track)
    }

    async fn request_audio(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<AudioTrack, AcquisitionError> {
        let track = AudioTrack {
            input_format: AUDIO_INPUT_FORMAT.to_string(),
            device: constraints
                .device
                .clone()
                .unwrap_or_else(|| self.audio_device.clone()),
        };

        tracing::debug!(device = %track.device, "probing microphone");
        Self::probe(Self::build_audio_probe_args(&track))
            .await
            .map_err(|e| AcquisitionError::audio(e))?;
        Ok(track)
    }
}

#[async_trait]
impl MediaEncoder for FfmpegCapture {
    async fn start(
        &self,
        stream: &MediaStream,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureSession>, CaptureError> {
        let video = stream.video();

        let scratch = match stream.audio() {
            Some(_) => Some(
                tempfile::Builder::new()
                    .prefix("screen-recorder-")
                    .tempdir()
                    .map_err(|e| CaptureError::StartFailed(e.to_string()))?,
            ),
            None => None,
        };
        let audio_pipe = scratch.as_ref().map(|dir| dir.path().join(AUDIO_PIPE_NAME));
        if let Some(path) = &audio_pipe {
            mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR)
                .map_err(|e| CaptureError::StartFailed(format!("mkfifo: {}", e)))?;
        }

        let encoder_args = build_encoder_args(stream, settings, audio_pipe.as_deref());
        tracing::debug!(args = ?encoder_args, "spawning ffmpeg encoder");
        let mut encoder = spawn_ffmpeg(&encoder_args, Stdio::piped())?;
        let encoder_stdin = encoder
            .stdin
            .take()
            .ok_or_else(|| CaptureError::StartFailed("encoder stdin not captured".to_string()))?;

        let mut feeds = vec![Feed::new(
            spawn_ffmpeg(&build_video_source_args(video), Stdio::null())?,
            encoder_stdin,
            video_frame_size(video),
        )];

        if let (Some(audio), Some(path)) = (stream.audio(), &audio_pipe) {
            // Read-write open never waits for the encoder to open its end
            let sender = pipe::OpenOptions::new()
                .read_write(true)
                .open_sender(path)
                .map_err(|e| CaptureError::StartFailed(e.to_string()))?;
            feeds.push(Feed::new(
                spawn_ffmpeg(&build_audio_source_args(audio), Stdio::null())?,
                sender,
                AUDIO_FEED_UNIT,
            ));
        }

        let mut session = FfmpegCaptureSession::spawn(encoder, feeds, settings.fragment_interval)?;
        if let Some(dir) = scratch {
            session = session.with_scratch_dir(dir);
        }
        Ok(Box::new(session))
    }
}

/// Spawn a long-running ffmpeg with stdout piped
fn spawn_ffmpeg(args: &[String], stdin: Stdio) -> Result<Child, CaptureError> {
    Command::new("ffmpeg")
        .args(args)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CaptureError::FfmpegNotFound
            } else {
                CaptureError::StartFailed(e.to_string())
            }
        })
}

/// Bytes in one raw frame of `track`
fn video_frame_size(track: &VideoTrack) -> usize {
    (track.width as usize) * (track.height as usize) * 3 / 2
}

fn quiet_args() -> Vec<String> {
    ["-hide_banner", "-loglevel", "error"]
        .map(String::from)
        .to_vec()
}

fn video_input_args(track: &VideoTrack) -> Vec<String> {
    vec![
        "-f".to_string(),
        track.input_format.clone(),
        "-video_size".to_string(),
        format!("{}x{}", track.width, track.height),
        "-framerate".to_string(),
        track.frame_rate.to_string(),
        "-i".to_string(),
        track.device.clone(),
    ]
}

fn audio_input_args(track: &AudioTrack) -> Vec<String> {
    vec![
        "-f".to_string(),
        track.input_format.clone(),
        "-i".to_string(),
        track.device.clone(),
    ]
}

fn raw_video_args(track: &VideoTrack) -> Vec<String> {
    vec![
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        RAW_PIXEL_FORMAT.to_string(),
        "-video_size".to_string(),
        format!("{}x{}", track.width, track.height),
        "-framerate".to_string(),
        track.frame_rate.to_string(),
    ]
}

fn raw_audio_args() -> Vec<String> {
    vec![
        "-f".to_string(),
        RAW_SAMPLE_FORMAT.to_string(),
        "-ar".to_string(),
        RAW_SAMPLE_RATE.to_string(),
        "-ac".to_string(),
        RAW_CHANNELS.to_string(),
    ]
}

/// Screen grabber writing raw frames to stdout
pub fn build_video_source_args(track: &VideoTrack) -> Vec<String> {
    let mut args = quiet_args();
    args.extend(video_input_args(track));
    args.extend(
        ["-f", "rawvideo", "-pix_fmt", RAW_PIXEL_FORMAT, "pipe:1"].map(String::from),
    );
    args
}

/// Microphone reader writing raw samples to stdout
pub fn build_audio_source_args(track: &AudioTrack) -> Vec<String> {
    let mut args = quiet_args();
    args.extend(audio_input_args(track));
    args.extend(raw_audio_args());
    args.push("pipe:1".to_string());
    args
}

/// Encoder reading raw frames on stdin (and samples from `audio_pipe`),
/// writing VP9/Opus muxed into the container on stdout
pub fn build_encoder_args(
    stream: &MediaStream,
    settings: &CaptureSettings,
    audio_pipe: Option<&Path>,
) -> Vec<String> {
    let mut args = quiet_args();
    args.extend(raw_video_args(stream.video()));
    args.extend(["-i", "pipe:0"].map(String::from));

    let audio_pipe = audio_pipe.filter(|_| stream.audio().is_some());
    if let Some(path) = audio_pipe {
        args.extend(raw_audio_args());
        args.push("-i".to_string());
        args.push(path.to_string_lossy().to_string());
    }

    args.extend(["-map", "0:v"].map(String::from));
    if audio_pipe.is_some() {
        args.extend(["-map", "1:a"].map(String::from));
    }

    args.extend([
        "-c:v".to_string(),
        "libvpx-vp9".to_string(),
        "-b:v".to_string(),
        settings.video_bits_per_second.to_string(),
        "-deadline".to_string(),
        "realtime".to_string(),
        "-cpu-used".to_string(),
        "8".to_string(),
    ]);
    if audio_pipe.is_some() {
        args.extend([
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            settings.audio_bits_per_second.to_string(),
        ]);
    }

    args.extend([
        "-f".to_string(),
        settings.container.muxer().to_string(),
        "pipe:1".to_string(),
    ]);
    args
}
