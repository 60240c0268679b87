use std::{sync::Arc, time::Duration};

use chrono::TimeDelta;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::{
    appsettings::{BusinessSettings, ReminderSettings},
    delivery::{DeliveryOutcome, test_utils::RecordingNotifier},
    models::appointment::{Appointment, AppointmentStatus, SlotTime},
    scheduling::test_utils::{BUSINESS, TestContext, at, utc},
    storage::{AppointmentStorage, NewAppointment, UpdateAppointment},
};

use super::*;

fn business() -> BusinessSettings {
    BusinessSettings {
        name: BUSINESS.to_string(),
        timezone: chrono_tz::UTC,
    }
}

fn scheduler(ctx: &TestContext) -> ReminderScheduler {
    ReminderScheduler::new(
        ctx.stores.clone(),
        Arc::new(ctx.notifier.clone()),
        ctx.clock.clone(),
        &business(),
        &ReminderSettings::default(),
    )
    .unwrap()
}

/// Books an appointment `ahead` from the context clock for a fresh customer.
async fn appointment_in(ctx: &TestContext, ahead: TimeDelta) -> Appointment {
    let service = ctx.service("Manicure").await;
    let customer = ctx.customer("+34600000001").await;
    let scheduled_at = ctx.clock.now().naive_utc() + ahead;

    ctx.stores
        .appointments
        .insert(NewAppointment {
            user_id: customer.id,
            service_id: service.id,
            scheduled_at: SlotTime::new(scheduled_at),
            created_at: ctx.clock.now(),
        })
        .await
        .unwrap()
}

async fn reminder_sent(ctx: &TestContext, appointment: &Appointment) -> bool {
    ctx.stores
        .appointments
        .get(appointment.id)
        .await
        .unwrap()
        .unwrap()
        .reminder_sent
}

#[test]
fn window_bounds_are_inclusive() {
    let window = ReminderWindow::default();

    assert!(window.contains(TimeDelta::hours(23)));
    assert!(window.contains(TimeDelta::hours(24)));
    assert!(window.contains(TimeDelta::hours(25)));
    assert!(!window.contains(TimeDelta::hours(23) - TimeDelta::minutes(1)));
    assert!(!window.contains(TimeDelta::hours(25) + TimeDelta::minutes(1)));
}

#[tokio::test]
async fn appointment_24h_ahead_is_reminded_26h_is_not() {
    let ctx = TestContext::new();
    let tomorrow = appointment_in(&ctx, TimeDelta::hours(24)).await;
    let later = appointment_in(&ctx, TimeDelta::hours(26)).await;

    let sent = scheduler(&ctx).tick().await;

    assert_eq!(sent, 1);
    assert!(reminder_sent(&ctx, &tomorrow).await);
    assert!(!reminder_sent(&ctx, &later).await);

    let messages = ctx.notifier.messages();
    let (phone, text, prefer_rich) = &messages[0];
    assert_eq!(phone, "+34600000001");
    assert!(text.contains("Manicure"));
    assert!(*prefer_rich);
}

#[tokio::test]
async fn second_tick_without_time_passing_sends_nothing() {
    let ctx = TestContext::new();
    appointment_in(&ctx, TimeDelta::hours(24)).await;
    let scheduler = scheduler(&ctx);

    assert_eq!(scheduler.tick().await, 1);
    assert_eq!(scheduler.tick().await, 0);
    assert_eq!(ctx.notifier.messages().len(), 1);
}

#[tokio::test]
async fn cancelled_appointments_are_not_reminded() {
    let ctx = TestContext::new();
    let appointment = appointment_in(&ctx, TimeDelta::hours(24)).await;
    let mut cancel = UpdateAppointment::new(appointment.id);
    cancel.status = Some(AppointmentStatus::Cancelled);
    ctx.stores.appointments.update(cancel).await.unwrap();

    assert_eq!(scheduler(&ctx).tick().await, 0);
    assert!(ctx.notifier.messages().is_empty());
}

#[tokio::test]
async fn appointment_is_caught_as_it_enters_the_window() {
    let ctx = TestContext::new();
    let appointment = appointment_in(&ctx, TimeDelta::hours(27) + TimeDelta::minutes(30)).await;
    let scheduler = scheduler(&ctx);

    let mut total = 0;
    for _ in 0..6 {
        total += scheduler.tick().await;
        ctx.clock.advance(TimeDelta::hours(1));
    }

    assert_eq!(total, 1);
    assert!(reminder_sent(&ctx, &appointment).await);
}

#[tokio::test]
async fn missing_customer_is_skipped_and_retried() {
    let ctx = TestContext::new();
    let service = ctx.service("Manicure").await;
    let orphan = ctx
        .stores
        .appointments
        .insert(NewAppointment {
            user_id: 404,
            service_id: service.id,
            scheduled_at: SlotTime::new(ctx.clock.now().naive_utc() + TimeDelta::hours(24)),
            created_at: ctx.clock.now(),
        })
        .await
        .unwrap();
    let scheduler = scheduler(&ctx);

    assert_eq!(scheduler.tick().await, 0);
    assert_eq!(scheduler.tick().await, 0);
    assert!(!reminder_sent(&ctx, &orphan).await);
    assert!(ctx.notifier.messages().is_empty());
}

#[tokio::test]
async fn undelivered_reminder_stays_unsent() {
    let ctx = TestContext::with_notifier(RecordingNotifier::with_outcome(DeliveryOutcome::Dropped));
    let appointment = appointment_in(&ctx, TimeDelta::hours(24)).await;

    assert_eq!(scheduler(&ctx).tick().await, 0);
    assert!(!reminder_sent(&ctx, &appointment).await);
}

#[tokio::test]
async fn one_failing_appointment_does_not_stop_the_batch() {
    let ctx = TestContext::new();
    let service = ctx.service("Manicure").await;
    ctx.stores
        .appointments
        .insert(NewAppointment {
            user_id: 404,
            service_id: service.id,
            scheduled_at: SlotTime::new(ctx.clock.now().naive_utc() + TimeDelta::hours(24)),
            created_at: ctx.clock.now(),
        })
        .await
        .unwrap();
    let healthy = appointment_in(&ctx, TimeDelta::hours(24) + TimeDelta::minutes(30)).await;

    assert_eq!(scheduler(&ctx).tick().await, 1);
    assert!(reminder_sent(&ctx, &healthy).await);
}

#[tokio::test]
async fn window_is_measured_on_business_wall_clock() {
    let ctx = TestContext::new();
    ctx.clock.set(utc("2025-06-09", "08:00"));
    let service = ctx.service("Manicure").await;
    let customer = ctx.customer("+34600000001").await;
    // 10:00 Madrid time on the 10th is 08:00 UTC, exactly 24h after the clock.
    let appointment = ctx
        .stores
        .appointments
        .insert(NewAppointment {
            user_id: customer.id,
            service_id: service.id,
            scheduled_at: SlotTime::new(at("2025-06-10", "10:00")),
            created_at: ctx.clock.now(),
        })
        .await
        .unwrap();
    let madrid = BusinessSettings {
        timezone: chrono_tz::Europe::Madrid,
        ..business()
    };
    let scheduler = ReminderScheduler::new(
        ctx.stores.clone(),
        Arc::new(ctx.notifier.clone()),
        ctx.clock.clone(),
        &madrid,
        &ReminderSettings {
            window_start_hours: 24,
            window_end_hours: 25,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(scheduler.tick().await, 1);
    assert!(reminder_sent(&ctx, &appointment).await);
}

#[tokio::test(start_paused = true)]
async fn spawned_loop_ticks_until_cancelled() {
    let ctx = TestContext::new();
    let first = appointment_in(&ctx, TimeDelta::hours(24)).await;
    let second = appointment_in(&ctx, TimeDelta::hours(30)).await;
    let shutdown = CancellationToken::new();
    let interval = Duration::from_secs(3600);
    let handle = Arc::new(scheduler(&ctx)).spawn(interval, shutdown.clone());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(reminder_sent(&ctx, &first).await);
    assert!(!reminder_sent(&ctx, &second).await);

    ctx.clock.advance(TimeDelta::hours(6));
    tokio::time::sleep(interval).await;
    assert!(reminder_sent(&ctx, &second).await);

    tokio::time::sleep(interval * 3).await;
    assert_eq!(ctx.notifier.messages().len(), 2);

    shutdown.cancel();
    handle.await.unwrap();
}

#[test]
fn invalid_window_settings_are_refused() {
    let ctx = TestContext::new();
    let inverted = ReminderSettings {
        window_start_hours: 25,
        window_end_hours: 23,
        ..Default::default()
    };

    let result = ReminderScheduler::new(
        ctx.stores.clone(),
        Arc::new(ctx.notifier.clone()),
        ctx.clock.clone(),
        &business(),
        &inverted,
    );

    assert!(result.is_err());
}

proptest! {
    #[test]
    fn only_appointments_inside_window_are_reminded(minutes_ahead in -(48 * 60i64)..(72 * 60)) {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async move {
                let ctx = TestContext::new();
                let ahead = TimeDelta::minutes(minutes_ahead);
                let appointment = appointment_in(&ctx, ahead).await;

                let sent = scheduler(&ctx).tick().await;

                let expected = ReminderWindow::default().contains(ahead);
                assert_eq!(sent == 1, expected, "ahead = {ahead}");
                assert_eq!(reminder_sent(&ctx, &appointment).await, expected);
            });
    }
}
