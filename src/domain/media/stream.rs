//! Acquired capture tracks and the combined stream

/// Screen video track obtained from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTrack {
    /// Input format, e.g. `x11grab`
    pub input_format: String,
    /// Input device, e.g. `:0.0`
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

/// Microphone track obtained from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    /// Input format, e.g. `pulse`
    pub input_format: String,
    /// Input device, e.g. `default`
    pub device: String,
}

/// Combined live capture stream: one video track plus at most one audio track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    video: VideoTrack,
    audio: Option<AudioTrack>,
}

impl MediaStream {
    /// Stream carrying only the screen video
    pub fn from_video(video: VideoTrack) -> Self {
        Self { video, audio: None }
    }

    /// Attach the microphone track, replacing any previous one
    pub fn add_audio_track(&mut self, audio: AudioTrack) {
        self.audio = Some(audio);
    }

    pub fn video(&self) -> &VideoTrack {
        &self.video
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    /// Check if both tracks are present
    pub fn is_combined(&self) -> bool {
        self.audio.is_some()
    }
}
