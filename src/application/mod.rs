//! Application layer - Use cases and port interfaces
//!
//! Contains the recording state machine, stream acquisition,
//! and trait definitions for external system interactions.

pub mod acquire;
pub mod ports;
pub mod recorder;

// Re-export use cases
pub use acquire::{AcquisitionEvent, StreamAcquirer};
pub use recorder::{RecorderError, RecordingStateMachine};
