//! Presentation projection: what the controls and status line show for a state

use super::state::RecordingState;

/// Label of the start control while no recording is active
pub const LABEL_START: &str = "start";
/// Label of the start control while a recording is active
pub const LABEL_STOP: &str = "stop";
/// Label of the pause control while recording
pub const LABEL_PAUSE: &str = "pause";
/// Label of the pause control while paused
pub const LABEL_RESUME: &str = "resume";

/// Status line after acquisition failed
pub const STATUS_INIT_FAILED: &str = "initialization failed";
/// Alert text after acquisition failed
pub const ALERT_INIT_FAILED: &str = "device initialization failed";

/// A single button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlView {
    pub enabled: bool,
    pub label: &'static str,
}

impl ControlView {
    const fn new(enabled: bool, label: &'static str) -> Self {
        Self { enabled, label }
    }
}

/// Everything the UI renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub start: ControlView,
    pub pause: ControlView,
    pub save_enabled: bool,
    pub status: &'static str,
}

impl Presentation {
    /// Project a state into its presentation.
    ///
    /// `has_recording` is true when a frozen, non-empty recording is available
    /// for saving. It only has an effect in the stopped state.
    pub const fn project(state: RecordingState, has_recording: bool) -> Self {
        match state {
            RecordingState::Stopped => Self {
                start: ControlView::new(true, LABEL_START),
                pause: ControlView::new(false, LABEL_PAUSE),
                save_enabled: has_recording,
                status: if has_recording {
                    "recording complete"
                } else {
                    "device ready"
                },
            },
            RecordingState::Recording => Self {
                start: ControlView::new(true, LABEL_STOP),
                pause: ControlView::new(true, LABEL_PAUSE),
                save_enabled: false,
                status: "recording",
            },
            RecordingState::Paused => Self {
                start: ControlView::new(false, LABEL_STOP),
                pause: ControlView::new(true, LABEL_RESUME),
                save_enabled: false,
                status: "recording paused",
            },
            RecordingState::AcquiringVideo => Self::all_disabled("checking video input"),
            RecordingState::AcquiringAudio => Self::all_disabled("checking audio input"),
        }
    }

    /// Presentation once acquisition has failed for good
    pub const fn acquisition_failed() -> Self {
        Self::all_disabled(STATUS_INIT_FAILED)
    }

    const fn all_disabled(status: &'static str) -> Self {
        Self {
            start: ControlView::new(false, LABEL_START),
            pause: ControlView::new(false, LABEL_PAUSE),
            save_enabled: false,
            status,
        }
    }

    /// Whether any control accepts input
    pub const fn any_enabled(&self) -> bool {
        self.start.enabled || self.pause.enabled || self.save_enabled
    }
}
