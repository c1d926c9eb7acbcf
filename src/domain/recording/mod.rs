//! Recording state machine domain

pub mod chunks;
pub mod notification;
pub mod presentation;
pub mod state;

pub use chunks::{BufferFrozen, ChunkBuffer, ChunkSequence, Fragment};
pub use notification::Notification;
pub use presentation::{ControlView, Presentation};
pub use state::{
    transition, Command, Event, InvalidCommand, RecordingState, StateChange, UnknownCommand,
};
