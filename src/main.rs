use std::sync::Arc;

use salon_booking::{
    appsettings::AppSettings,
    clock::{Clock, SystemClock},
    delivery::{FallbackNotifier, LogDeliveryChannel, Notifier, start_notification_queue},
    scheduling::{ReminderScheduler, SchedulingEngine, Stores},
    storage::{
        InMemoryAppointmentStorage, InMemoryPromotionCatalog, InMemoryServiceCatalog,
        InMemoryUserDirectory,
    },
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load()?;
    log::info!(
        "Starting booking engine. [business = {}, timezone = {}]",
        settings.business.name,
        settings.business.timezone
    );

    let stores = Stores::new(
        Arc::new(InMemoryAppointmentStorage::new()),
        Arc::new(InMemoryServiceCatalog::new()),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(InMemoryPromotionCatalog::new()),
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(FallbackNotifier::new(
        Some(Arc::new(LogDeliveryChannel::new("whatsapp"))),
        Some(Arc::new(LogDeliveryChannel::new("sms"))),
    ));

    let (notifications, notification_worker) =
        start_notification_queue(Arc::clone(&notifier), settings.notifications.queue_capacity);
    // Handed to the API layer, which lives outside this binary.
    let engine = SchedulingEngine::new(
        stores.clone(),
        notifications,
        Arc::clone(&clock),
        settings.business.name.clone(),
    )
    .with_rich_confirmations(settings.notifications.prefer_rich_confirmations);

    let shutdown = CancellationToken::new();
    let reminders = Arc::new(ReminderScheduler::new(
        stores,
        notifier,
        clock,
        &settings.business,
        &settings.reminders,
    )?);
    let reminder_task = reminders.spawn(settings.reminders.interval(), shutdown.clone());

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown requested");
    shutdown.cancel();
    reminder_task.await?;
    drop(engine);
    notification_worker.finished().await;

    Ok(())
}
