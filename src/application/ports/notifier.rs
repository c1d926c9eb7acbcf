//! Outbound state notification port

use crate::domain::recording::Notification;

/// Port for announcing state changes to external controllers.
/// Fire-and-forget: implementations must not block and never report failure.
pub trait StateNotifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
