//! Typed publish/subscribe notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Broadcast hub; every subscriber sees every notification published after
/// it subscribed.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers reached
    pub fn publish(&self, kind: NotificationKind, message: impl Into<String>) -> usize {
        let notification = Notification {
            kind,
            message: message.into(),
        };
        match self.sender.send(notification) {
            Ok(n) => n,
            Err(_) => {
                debug!("Notification dropped, no subscribers");
                0
            }
        }
    }

    pub fn success(&self, message: impl Into<String>) -> usize {
        self.publish(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> usize {
        self.publish(NotificationKind::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> usize {
        self.publish(NotificationKind::Info, message)
    }
}
