//! Exported artifact value object

use chrono::{DateTime, Local};

use super::container::ContainerType;
use crate::domain::recording::ChunkSequence;

/// Timestamp format of exported file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A finished recording assembled into one blob, ready to be written out
#[derive(Debug, Clone)]
pub struct ExportedArtifact {
    data: Vec<u8>,
    container: ContainerType,
}

impl ExportedArtifact {
    /// Assemble a frozen sequence
    pub fn assemble(sequence: &ChunkSequence, container: ContainerType) -> Self {
        Self {
            data: sequence.concat(),
            container,
        }
    }

    /// Get the raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Container the bytes are muxed in
    pub fn container(&self) -> ContainerType {
        self.container
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File name for a save at `at`, e.g. `2024-03-01_14-05-09.webm`
    pub fn file_name(&self, at: &DateTime<Local>) -> String {
        format!(
            "{}.{}",
            at.format(FILE_TIMESTAMP_FORMAT),
            self.container.extension()
        )
    }

    /// Get human-readable size string
    pub fn human_readable_size(&self) -> String {
        let bytes = self.data.len();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
