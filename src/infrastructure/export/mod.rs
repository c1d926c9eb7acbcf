//! Recording export adapters

mod file_store;

pub use file_store::FileArtifactStore;
