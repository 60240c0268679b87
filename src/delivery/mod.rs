mod fallback;
mod queue;
#[cfg(test)]
pub(crate) mod test_utils;

pub use fallback::{FallbackNotifier, LogDeliveryChannel};
pub use queue::{Notification, NotificationSender, NotificationWorker, start_notification_queue};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Message rejected by channel: {0}")]
    Rejected(String),

    #[error("Channel unreachable: {0}")]
    Unreachable(String),
}

/// A single outbound transport, e.g. a messaging app or SMS gateway.
#[async_trait]
pub trait DeliveryChannel: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    async fn deliver(&self, phone: &str, message: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DeliveryOutcome {
    Delivered { fallback: bool },
    Dropped,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Sends a text to a phone number. Never fails to the caller: delivery
/// problems are logged and reported as [`DeliveryOutcome::Dropped`].
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, phone: &str, message: &str, prefer_rich_channel: bool) -> DeliveryOutcome;
}
