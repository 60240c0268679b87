use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use super::Notifier;

#[derive(Debug, Clone)]
pub struct Notification {
    pub phone: String,
    pub message: String,
    pub prefer_rich_channel: bool,
}

/// Handle used by request handlers to hand off notifications.
///
/// Enqueueing never waits: when the queue is full or the worker is gone the
/// notification is dropped and logged.
#[derive(Clone)]
pub struct NotificationSender(mpsc::Sender<Notification>);

impl NotificationSender {
    pub fn enqueue(&self, notification: Notification) {
        match self.0.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(notification)) => log::warn!(
                "Notification queue full, dropping message. [phone = {}]",
                notification.phone
            ),
            Err(TrySendError::Closed(notification)) => log::warn!(
                "Notification worker stopped, dropping message. [phone = {}]",
                notification.phone
            ),
        }
    }
}

pub struct NotificationWorker {
    task: JoinHandle<()>,
}

impl NotificationWorker {
    /// Waits until every sender is dropped and the queue is drained.
    pub async fn finished(self) {
        if let Err(error) = self.task.await {
            log::error!("Notification worker panicked: {}", error);
        }
    }
}

pub fn start_notification_queue(
    notifier: Arc<dyn Notifier>,
    capacity: usize,
) -> (NotificationSender, NotificationWorker) {
    let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));
    let task = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let outcome = notifier
                .send(
                    &notification.phone,
                    &notification.message,
                    notification.prefer_rich_channel,
                )
                .await;
            log::debug!(
                "Notification processed. [phone = {}, outcome = {:?}]",
                notification.phone,
                outcome
            );
        }
        log::info!("Notification worker shutting down");
    });

    (NotificationSender(tx), NotificationWorker { task })
}
