//! Domain layer - Core recording logic
//!
//! Contains the state machine's pure parts, value objects, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod media;
pub mod recording;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use media::{ContainerType, ExportedArtifact, MediaStream};
pub use recording::{
    ChunkBuffer, ChunkSequence, Command, Notification, Presentation, RecordingState,
};
