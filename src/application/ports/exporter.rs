//! Export port interface

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use thiserror::Error;

use crate::domain::media::ExportedArtifact;

/// Export errors
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("Cannot save while the recorder is {0}")]
    NotStopped(String),

    #[error("No finished recording to save")]
    NoRecording,

    #[error("Failed to write recording: {0}")]
    WriteFailed(String),
}

/// Port for persisting an exported recording
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `artifact` under a name derived from `at`.
    ///
    /// # Returns
    /// The path of the written file
    async fn save(
        &self,
        artifact: &ExportedArtifact,
        at: DateTime<Local>,
    ) -> Result<PathBuf, ExportError>;
}
