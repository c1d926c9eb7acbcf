//! Recording state and the pure transition function

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordingState {
    #[default]
    AcquiringVideo,
    AcquiringAudio,
    Stopped,
    Recording,
    Paused,
}

impl RecordingState {
    /// All states, in lifecycle order
    pub const ALL: [RecordingState; 5] = [
        Self::AcquiringVideo,
        Self::AcquiringAudio,
        Self::Stopped,
        Self::Recording,
        Self::Paused,
    ];

    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AcquiringVideo => "acquiring-video",
            Self::AcquiringAudio => "acquiring-audio",
            Self::Stopped => "stopped",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }

    /// Whether devices are still being acquired
    pub const fn is_acquiring(&self) -> bool {
        matches!(self, Self::AcquiringVideo | Self::AcquiringAudio)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inbound commands, shared by the UI controls and the external channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    StartOrStop,
    PauseOrResume,
}

impl Command {
    /// Wire name used on the control socket
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartOrStop => "startOrStop",
            Self::PauseOrResume => "pauseOrResume",
        }
    }

    /// Resolve the toggle into a concrete event for the given state.
    ///
    /// Returns `None` when the state has no handler for this command.
    pub const fn resolve(&self, state: RecordingState) -> Option<Event> {
        match (self, state) {
            (Self::StartOrStop, RecordingState::Stopped) => Some(Event::Start),
            (Self::StartOrStop, RecordingState::Recording) => Some(Event::Stop),
            (Self::PauseOrResume, RecordingState::Recording) => Some(Event::Pause),
            (Self::PauseOrResume, RecordingState::Paused) => Some(Event::Resume),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when a command name is not recognized
#[derive(Debug, Clone, Error)]
#[error("Unknown command: \"{input}\". Expected startOrStop or pauseOrResume")]
pub struct UnknownCommand {
    pub input: String,
}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "startOrStop" => Ok(Self::StartOrStop),
            "pauseOrResume" => Ok(Self::PauseOrResume),
            _ => Err(UnknownCommand {
                input: s.to_string(),
            }),
        }
    }
}

/// Events that drive the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    VideoReady,
    AudioReady,
    Start,
    Pause,
    Resume,
    Stop,
}

/// Pure transition function.
///
/// State machine:
///   ACQUIRING_VIDEO -> ACQUIRING_AUDIO (video ready)
///   ACQUIRING_AUDIO -> STOPPED (audio ready)
///   STOPPED -> RECORDING (start)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING -> STOPPED (stop)
pub const fn transition(state: RecordingState, event: Event) -> Option<RecordingState> {
    use RecordingState::*;

    match (state, event) {
        (AcquiringVideo, Event::VideoReady) => Some(AcquiringAudio),
        (AcquiringAudio, Event::AudioReady) => Some(Stopped),
        (Stopped, Event::Start) => Some(Recording),
        (Recording, Event::Pause) => Some(Paused),
        (Paused, Event::Resume) => Some(Recording),
        (Recording, Event::Stop) => Some(Stopped),
        _ => None,
    }
}

/// A transition that took place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: RecordingState,
    pub to: RecordingState,
}

/// A command the current state has no handler for
#[derive(Debug, Clone, Error)]
#[error("Command {command} has no effect while in {state} state")]
pub struct InvalidCommand {
    pub command: Command,
    pub state: RecordingState,
}
