//! Media value objects: constraints, tracks, containers, artifacts

pub mod artifact;
pub mod constraints;
pub mod container;
pub mod stream;

pub use artifact::ExportedArtifact;
pub use constraints::{AudioConstraints, CaptureSettings, VideoConstraints};
pub use container::ContainerType;
pub use stream::{AudioTrack, MediaStream, VideoTrack};
