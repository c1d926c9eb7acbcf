//! Screen recorder - capture the screen and microphone to WebM
//!
//! Acquires an X11 screen source and a PulseAudio microphone through ffmpeg,
//! then records, pauses, resumes and stops on request. Finished recordings
//! are kept in memory until saved as a timestamped `.webm` file.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Recording states and transitions, presentation, media types
//! - **Application**: The recording state machine, stream acquisition and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (ffmpeg, file export, notifications, config)
//! - **CLI**: Argument parsing, control socket, signal handling and the event loop

#[cfg(not(target_os = "linux"))]
compile_error!("screen-recorder captures through X11 and PulseAudio on Linux");

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
