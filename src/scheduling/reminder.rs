use std::{sync::Arc, time::Duration};

use chrono::{NaiveDateTime, TimeDelta};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use config::ConfigError;

use crate::{
    appsettings::{BusinessSettings, ReminderSettings},
    clock::Clock,
    delivery::Notifier,
    models::appointment::Appointment,
    storage::{
        AppointmentStorage, ServiceCatalog, StorageError, UpdateAppointment, UserDirectory,
    },
};

use super::{Stores, messages};

/// Look-ahead range for one-time reminders, inclusive on both ends.
///
/// The range must be at least as wide as the tick interval, otherwise an
/// appointment can cross it between two ticks without being seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub start: TimeDelta,
    pub end: TimeDelta,
}

impl ReminderWindow {
    pub fn new(start: TimeDelta, end: TimeDelta) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time_until: TimeDelta) -> bool {
        self.start <= time_until && time_until <= self.end
    }
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self::new(TimeDelta::hours(23), TimeDelta::hours(25))
    }
}

enum ReminderAttempt {
    Sent,
    Skipped,
    Undelivered,
}

pub struct ReminderScheduler {
    stores: Stores,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    timezone: chrono_tz::Tz,
    business_name: String,
    window: ReminderWindow,
    prefer_rich_channel: bool,
}

impl ReminderScheduler {
    pub fn new(
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        business: &BusinessSettings,
        reminders: &ReminderSettings,
    ) -> Result<Self, ConfigError> {
        let (start, end) = reminders.window()?;
        Ok(Self {
            stores,
            notifier,
            clock,
            timezone: business.timezone,
            business_name: business.name.clone(),
            window: ReminderWindow::new(start, end),
            prefer_rich_channel: reminders.prefer_rich_channel,
        })
    }

    /// Runs `tick` immediately and then every `interval` until `shutdown`
    /// is cancelled.
    pub fn spawn(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            log::info!("Reminder scheduler started. [interval = {:?}]", interval);
            loop {
                self.tick().await;
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        log::info!("Reminder scheduler shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        })
    }

    /// One scan over unsent reminders. Returns how many were delivered.
    ///
    /// Never fails: store and delivery problems are logged and the affected
    /// appointment is left for the next tick.
    pub async fn tick(&self) -> usize {
        let pending = match self.stores.appointments.get_pending_reminders().await {
            Ok(pending) => pending,
            Err(error) => {
                log::error!("Could not load pending reminders: {}", error);
                return 0;
            }
        };

        let now = self.local_now();
        let mut sent = 0;
        for appointment in pending.iter().filter(|a| self.is_due(a, now)) {
            match self.remind(appointment).await {
                Ok(ReminderAttempt::Sent) => sent += 1,
                Ok(ReminderAttempt::Skipped | ReminderAttempt::Undelivered) => {}
                Err(error) => log::error!(
                    "Reminder failed. [appointment_id = {}, error = {}]",
                    appointment.id,
                    error
                ),
            }
        }

        log::info!(
            "Reminder tick finished. [pending = {}, sent = {}]",
            pending.len(),
            sent
        );
        sent
    }

    fn local_now(&self) -> NaiveDateTime {
        self.clock.now().with_timezone(&self.timezone).naive_local()
    }

    fn is_due(&self, appointment: &Appointment, now: NaiveDateTime) -> bool {
        self.window
            .contains(*appointment.scheduled_at.datetime() - now)
    }

    async fn remind(&self, appointment: &Appointment) -> Result<ReminderAttempt, StorageError> {
        // A missing customer or service is retried on every tick while the
        // appointment stays in the window.
        let Some(user) = self.stores.users.get(appointment.user_id).await? else {
            log::warn!(
                "Skipping reminder, customer missing. [appointment_id = {}, user_id = {}]",
                appointment.id,
                appointment.user_id
            );
            return Ok(ReminderAttempt::Skipped);
        };
        let Some(service) = self.stores.services.get(appointment.service_id).await? else {
            log::warn!(
                "Skipping reminder, service missing. [appointment_id = {}, service_id = {}]",
                appointment.id,
                appointment.service_id
            );
            return Ok(ReminderAttempt::Skipped);
        };

        let message =
            messages::appointment_reminder(&self.business_name, &service, &appointment.scheduled_at);
        let outcome = self
            .notifier
            .send(&user.phone, &message, self.prefer_rich_channel)
            .await;
        if !outcome.is_delivered() {
            log::warn!(
                "Reminder not delivered, will retry. [appointment_id = {}]",
                appointment.id
            );
            return Ok(ReminderAttempt::Undelivered);
        }

        let mut update = UpdateAppointment::new(appointment.id);
        update.mark_reminder_sent = true;
        match self.stores.appointments.update(update).await {
            Ok(0) => log::warn!(
                "Reminder sent for vanished appointment. [appointment_id = {}]",
                appointment.id
            ),
            Ok(_) => log::info!("Reminder sent. [appointment_id = {}]", appointment.id),
            Err(error) => log::error!(
                "Reminder sent but not recorded. [appointment_id = {}, error = {}]",
                appointment.id,
                error
            ),
        }

        Ok(ReminderAttempt::Sent)
    }
}

#[cfg(test)]
mod tests;
