//! Outbound collaborators: desktop-style notifications and the badge.
//!
//! The poller only knows the [`NotificationTransport`] and [`BadgeSink`]
//! seams. The binary wires the log-backed implementations below; tests
//! use the recording doubles in [`test_support`].

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::poller::Badge;

/// Tag identifying the batched notification so a newer one replaces it.
pub const NOTIFICATION_TAG: &str = "pr-updates";

/// One user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short heading.
    pub title: String,
    /// Detail or summary line.
    pub body: String,
    /// Replacement tag.
    pub tag: String,
}

impl Notification {
    /// Creates a notification tagged with [`NOTIFICATION_TAG`].
    #[must_use]
    pub fn tagged(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tag: NOTIFICATION_TAG.to_owned(),
        }
    }
}

/// Delivery failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification delivery failed: {message}")]
pub struct DeliveryError {
    /// Transport-specific detail.
    pub message: String,
}

/// Shows notifications to the user.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Delivers `notification`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the notification could not be shown.
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Receives every badge change.
pub trait BadgeSink: Send + Sync {
    /// Publishes `badge`.
    fn publish(&self, badge: Badge);
}

/// Transport that writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationTransport;

#[async_trait]
impl NotificationTransport for LogNotificationTransport {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            tag = %notification.tag,
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}

/// Badge sink that logs each change.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBadgeSink;

impl BadgeSink for LogBadgeSink {
    fn publish(&self, badge: Badge) {
        info!(badge = %badge, "badge updated");
    }
}

/// Recording doubles for asserting on outbound traffic.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{BadgeSink, DeliveryError, Notification, NotificationTransport};
    use crate::poller::Badge;

    /// Transport that keeps every delivered notification.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        delivered: Mutex<Vec<Notification>>,
        failure: Option<String>,
    }

    impl RecordingTransport {
        /// Creates a transport that accepts every notification.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a transport that records and then fails every delivery.
        #[must_use]
        pub fn failing(message: &str) -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
                failure: Some(message.to_owned()),
            }
        }

        /// Notifications delivered so far.
        #[must_use]
        pub fn delivered(&self) -> Vec<Notification> {
            self.delivered
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl NotificationTransport for RecordingTransport {
        async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
            if let Ok(mut guard) = self.delivered.lock() {
                guard.push(notification.clone());
            }
            self.failure.as_ref().map_or(Ok(()), |message| {
                Err(DeliveryError {
                    message: message.clone(),
                })
            })
        }
    }

    /// Sink that keeps every published badge.
    #[derive(Debug, Default)]
    pub struct RecordingBadgeSink {
        published: Mutex<Vec<Badge>>,
    }

    impl RecordingBadgeSink {
        /// Creates an empty sink.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Badges published so far, oldest first.
        #[must_use]
        pub fn published(&self) -> Vec<Badge> {
            self.published
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default()
        }

        /// Most recent badge, if any.
        #[must_use]
        pub fn latest(&self) -> Option<Badge> {
            self.published().last().copied()
        }
    }

    impl BadgeSink for RecordingBadgeSink {
        fn publish(&self, badge: Badge) {
            if let Ok(mut guard) = self.published.lock() {
                guard.push(badge);
            }
        }
    }
}
