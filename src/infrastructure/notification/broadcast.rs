//! In-process fan-out of state notifications

use tokio::sync::broadcast;

use crate::application::ports::StateNotifier;
use crate::domain::recording::Notification;

/// Default number of notifications a slow subscriber may lag behind
pub const DEFAULT_CAPACITY: usize = 16;

/// Publishes notifications to every current subscriber.
/// Having no subscribers is not an error.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every notification sent from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StateNotifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(%notification, "state notification");
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_without_subscribers() {
        BroadcastNotifier::default().notify(Notification::Recording);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let notifier = BroadcastNotifier::default();
        let mut first = notifier.subscribe();
        let mut second = notifier.clone().subscribe();

        notifier.notify(Notification::Recording);
        notifier.notify(Notification::Paused);

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap(), Notification::Recording);
            assert_eq!(rx.recv().await.unwrap(), Notification::Paused);
        }
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier() {
        let notifier = BroadcastNotifier::default();
        notifier.notify(Notification::Recording);

        let mut rx = notifier.subscribe();
        notifier.notify(Notification::Stopped);
        assert_eq!(rx.recv().await.unwrap(), Notification::Stopped);
    }
}
