//! Domain error types

use std::fmt;

use thiserror::Error;

/// Acquisition step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStep {
    Video,
    Audio,
}

impl fmt::Display for AcquisitionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Device acquisition failed. Denied permission and missing devices are not
/// distinguished; `step` is kept for diagnostics only.
#[derive(Debug, Clone, Error)]
#[error("Failed to acquire {step} input: {reason}")]
pub struct AcquisitionError {
    pub step: AcquisitionStep,
    pub reason: String,
}

impl AcquisitionError {
    pub fn video(reason: impl Into<String>) -> Self {
        Self {
            step: AcquisitionStep::Video,
            reason: reason.into(),
        }
    }

    pub fn audio(reason: impl Into<String>) -> Self {
        Self {
            step: AcquisitionStep::Audio,
            reason: reason.into(),
        }
    }
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisition_error_display() {
        let err = AcquisitionError::video("permission denied");
        assert_eq!(
            err.to_string(),
            "Failed to acquire video input: permission denied"
        );
        assert_eq!(AcquisitionError::audio("x").step, AcquisitionStep::Audio);
    }
}
