use std::sync::Arc;

use async_trait::async_trait;

use super::{DeliveryChannel, DeliveryError, DeliveryOutcome, Notifier};

/// Tries the preferred channel first and falls back to the other one.
///
/// Either channel may be absent; with no channels at all every message is
/// dropped with a warning.
pub struct FallbackNotifier {
    rich: Option<Arc<dyn DeliveryChannel>>,
    plain: Option<Arc<dyn DeliveryChannel>>,
}

impl FallbackNotifier {
    pub fn new(
        rich: Option<Arc<dyn DeliveryChannel>>,
        plain: Option<Arc<dyn DeliveryChannel>>,
    ) -> Self {
        Self { rich, plain }
    }

    fn channels(&self, prefer_rich_channel: bool) -> [Option<&Arc<dyn DeliveryChannel>>; 2] {
        if prefer_rich_channel {
            [self.rich.as_ref(), self.plain.as_ref()]
        } else {
            [self.plain.as_ref(), self.rich.as_ref()]
        }
    }
}

#[async_trait]
impl Notifier for FallbackNotifier {
    async fn send(&self, phone: &str, message: &str, prefer_rich_channel: bool) -> DeliveryOutcome {
        let mut attempted = false;
        for channel in self.channels(prefer_rich_channel).into_iter().flatten() {
            match channel.deliver(phone, message).await {
                Ok(()) => {
                    return DeliveryOutcome::Delivered {
                        fallback: attempted,
                    };
                }
                Err(error) => {
                    log::warn!(
                        "Delivery failed, trying next channel. [channel = {}, error = {}]",
                        channel.name(),
                        error
                    );
                    attempted = true;
                }
            }
        }

        if attempted {
            log::error!("All delivery channels failed. [phone = {}]", phone);
        } else {
            log::warn!("No delivery channel configured, dropping message. [phone = {}]", phone);
        }

        DeliveryOutcome::Dropped
    }
}

/// Writes messages to the log instead of sending them.
pub struct LogDeliveryChannel {
    name: &'static str,
}

impl LogDeliveryChannel {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl DeliveryChannel for LogDeliveryChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, phone: &str, message: &str) -> Result<(), DeliveryError> {
        if phone.trim().is_empty() {
            return Err(DeliveryError::Rejected("empty phone number".to_string()));
        }

        log::info!("[{}] to {}: {}", self.name, phone, message);
        Ok(())
    }
}
