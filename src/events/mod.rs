use crate::lyrics::CompletionNotification;
use tokio::sync::broadcast;
use tracing::debug;

/// Fire-and-forget sink for completion notifications.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, notification: CompletionNotification);
}

impl EventPublisher for broadcast::Sender<CompletionNotification> {
    fn publish(&self, notification: CompletionNotification) {
        // No subscribers is not an error for the publisher
        if let Err(e) = self.send(notification) {
            debug!("Notification for {} had no subscribers", e.0.track);
        }
    }
}
