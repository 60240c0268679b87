use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{DeliveryChannel, DeliveryError, DeliveryOutcome, Notifier};

type Sent = Arc<Mutex<Vec<(String, String)>>>;

#[derive(Clone)]
pub struct RecordingChannel {
    name: &'static str,
    fail: bool,
    sent: Sent,
}

impl RecordingChannel {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            sent: Default::default(),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn arc(&self) -> Arc<dyn DeliveryChannel> {
        Arc::new(self.clone())
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, phone: &str, message: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Unreachable(self.name.to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}

/// Notifier that records every request and answers with a fixed outcome.
#[derive(Clone)]
pub struct RecordingNotifier {
    outcome: DeliveryOutcome,
    sent: Arc<Mutex<Vec<(String, String, bool)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::with_outcome(DeliveryOutcome::Delivered { fallback: false })
    }

    pub fn with_outcome(outcome: DeliveryOutcome) -> Self {
        Self {
            outcome,
            sent: Default::default(),
        }
    }

    pub fn messages(&self) -> Vec<(String, String, bool)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, phone: &str, message: &str, prefer_rich_channel: bool) -> DeliveryOutcome {
        self.sent.lock().unwrap().push((
            phone.to_string(),
            message.to_string(),
            prefer_rich_channel,
        ));
        self.outcome
    }
}
