//! Media container types

use std::fmt;

/// Supported output containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerType {
    #[default]
    Webm,
}

impl ContainerType {
    /// Get the MIME type string
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
        }
    }

    /// Muxer name understood by ffmpeg
    pub const fn muxer(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}
