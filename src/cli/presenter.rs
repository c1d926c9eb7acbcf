//! CLI presenter for output formatting

use std::sync::Mutex;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::ports::PresentationSink;
use crate::domain::recording::presentation::STATUS_INIT_FAILED;
use crate::domain::recording::{ControlView, Presentation};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message, starting one if needed
    pub fn update_spinner(&mut self, message: &str) {
        match self.spinner {
            Some(ref spinner) => spinner.set_message(message.to_string()),
            None => self.start_spinner(message),
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print recorder status
    pub fn recorder_status(&self, status: &str) {
        eprintln!("{} Recorder: {}", "●".cyan(), status);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the recorder's presentation to the terminal.
///
/// While devices are being checked the status is shown on a spinner;
/// afterwards every change prints one status line with the controls.
pub struct TerminalPresenter {
    inner: Mutex<Presenter>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Presenter::new()),
        }
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationSink for TerminalPresenter {
    fn render(&self, presentation: &Presentation) {
        let mut presenter = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if is_checking_devices(presentation) {
            presenter.update_spinner(&format!("{}...", presentation.status));
        } else if presentation.status == STATUS_INIT_FAILED {
            presenter.spinner_fail(presentation.status);
        } else {
            presenter.stop_spinner();
            presenter.recorder_status(&format_presentation(presentation));
        }
    }

    fn alert(&self, message: &str) {
        let presenter = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        presenter.error(message);
    }
}

/// Nothing is enabled while devices are still being checked
fn is_checking_devices(presentation: &Presentation) -> bool {
    !presentation.any_enabled() && presentation.status != STATUS_INIT_FAILED
}

/// One status line: the status followed by the controls
pub fn format_presentation(presentation: &Presentation) -> String {
    format!(
        "{}  [{}] [{}] [{}]",
        presentation.status.bold(),
        format_control(&presentation.start),
        format_control(&presentation.pause),
        format_control(&ControlView {
            enabled: presentation.save_enabled,
            label: "save",
        }),
    )
}

fn format_control(control: &ControlView) -> ColoredString {
    if control.enabled {
        control.label.green()
    } else {
        control.label.dimmed()
    }
}
