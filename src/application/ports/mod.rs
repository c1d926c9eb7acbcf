//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod exporter;
pub mod notifier;
pub mod presentation;

// Re-export common types
pub use capture::{CaptureError, CaptureSession, MediaDevices, MediaEncoder};
pub use config::ConfigStore;
pub use exporter::{ArtifactStore, ExportError};
pub use notifier::StateNotifier;
pub use presentation::PresentationSink;
