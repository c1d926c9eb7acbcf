//! Outbound state notifications

use std::fmt;

use super::state::RecordingState;

/// Notification emitted on entering a user-visible state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    Recording,
    Paused,
    Stopped,
}

impl Notification {
    /// Notification for entering `state`, if that state announces itself
    pub const fn for_state(state: RecordingState) -> Option<Self> {
        match state {
            RecordingState::Recording => Some(Self::Recording),
            RecordingState::Paused => Some(Self::Paused),
            RecordingState::Stopped => Some(Self::Stopped),
            RecordingState::AcquiringVideo | RecordingState::AcquiringAudio => None,
        }
    }

    /// Wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
