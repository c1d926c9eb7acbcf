//! Device constraints and capture session parameters

use std::ops::RangeInclusive;
use std::time::Duration;

use super::container::ContainerType;

/// Screen capture width in pixels
pub const SCREEN_WIDTH: u32 = 1280;
/// Allowed screen capture heights in pixels
pub const SCREEN_HEIGHT: RangeInclusive<u32> = 720..=800;

/// Audio bitrate in bits per second
pub const AUDIO_BITS_PER_SECOND: u32 = 64_000;
/// Video bitrate in bits per second
pub const VIDEO_BITS_PER_SECOND: u32 = 625_000;
/// Fragment emission interval
pub const FRAGMENT_INTERVAL: Duration = Duration::from_millis(20);

/// Constraints for the screen video request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: RangeInclusive<u32>,
    pub frame_rate: u32,
}

impl VideoConstraints {
    /// Screen capture at the fixed resolution band
    pub fn screen(frame_rate: u32) -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            frame_rate,
        }
    }

    /// Height picked from the allowed band
    pub fn ideal_height(&self) -> u32 {
        *self.height.start()
    }

    /// Check whether a concrete resolution satisfies the constraints
    pub fn accepts(&self, width: u32, height: u32) -> bool {
        width == self.width && self.height.contains(&height)
    }
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self::screen(30)
    }
}

/// Constraints for the microphone request (defaults only)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioConstraints {
    /// Device name; `None` selects the system default
    pub device: Option<String>,
}

/// Parameters of one capture-and-encode session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub container: ContainerType,
    pub audio_bits_per_second: u32,
    pub video_bits_per_second: u32,
    pub fragment_interval: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            container: ContainerType::Webm,
            audio_bits_per_second: AUDIO_BITS_PER_SECOND,
            video_bits_per_second: VIDEO_BITS_PER_SECOND,
            fragment_interval: FRAGMENT_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_constraints() {
        let c = VideoConstraints::screen(30);
        assert_eq!(c.width, 1280);
        assert_eq!(c.ideal_height(), 720);
    }

    #[test]
    fn accepts_heights_in_band() {
        let c = VideoConstraints::default();
        assert!(c.accepts(1280, 720));
        assert!(c.accepts(1280, 800));
        assert!(!c.accepts(1280, 801));
        assert!(!c.accepts(1920, 720));
    }

    #[test]
    fn default_settings() {
        let s = CaptureSettings::default();
        assert_eq!(s.audio_bits_per_second, 64_000);
        assert_eq!(s.video_bits_per_second, 625_000);
        assert_eq!(s.fragment_interval, Duration::from_millis(20));
        assert_eq!(s.container, ContainerType::Webm);
    }
}
