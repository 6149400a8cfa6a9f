// ── User-visible notifications ──
//
// The single transient notice channel. Every failure the operator should
// see is published here exactly once, by the controller; front ends
// subscribe and render. Sending with no subscribers is not an error.

use std::fmt;

use serde::Serialize;
use strum::Display;
use tokio::sync::broadcast;

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Error,
}

/// One transient notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Broadcast sender for [`Notification`]s.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn publish(&self, level: Level, message: impl Into<String>) {
        let _ = self.tx.send(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Level::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Level::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Level::Error, message);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.error("Node list failed");
        notifier.success("Token revoked");

        assert_eq!(rx.try_recv().unwrap().level, Level::Error);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.to_string(), "Token revoked");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        Notifier::new().info("nobody listening");
    }
}
