//! UI binding port

use crate::domain::recording::Presentation;

/// Port for the user interface the recorder renders into
pub trait PresentationSink: Send + Sync {
    /// Render controls and status
    fn render(&self, presentation: &Presentation);

    /// Show a blocking alert
    fn alert(&self, message: &str);
}
