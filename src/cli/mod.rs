//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the control socket and the recorder runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod control_cmd;
pub mod ipc;
pub mod pid_file;
pub mod presenter;
pub mod recorder_app;
pub mod signals;

// Re-export commonly used types
pub use app::{load_merged_config, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, CtlAction, RecorderOptions};
pub use control_cmd::handle_ctl_command;
pub use presenter::{Presenter, TerminalPresenter};
pub use recorder_app::run_recorder;
