//! Filesystem artifact store

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::fs;

use crate::application::ports::{ArtifactStore, ExportError};
use crate::domain::media::ExportedArtifact;

/// Writes exported recordings into a directory
pub struct FileArtifactStore {
    output_dir: PathBuf,
}

impl FileArtifactStore {
    /// Create a store writing into `output_dir`, created on first save
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory recordings are written into
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save(
        &self,
        artifact: &ExportedArtifact,
        at: DateTime<Local>,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExportError::WriteFailed(e.to_string()))?;

        let path = self.output_dir.join(artifact.file_name(&at));
        fs::write(&path, artifact.data())
            .await
            .map_err(|e| ExportError::WriteFailed(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            container = %artifact.container(),
            bytes = artifact.size(),
            "recording saved"
        );
        Ok(path)
    }
}
