use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::{
    clock::ManualClock,
    delivery::{NotificationWorker, start_notification_queue, test_utils::RecordingNotifier},
    models::{
        service::{Service, ServiceId},
        user::{Role, User},
    },
    storage::{
        InMemoryAppointmentStorage, InMemoryPromotionCatalog, InMemoryServiceCatalog,
        InMemoryUserDirectory, NewService, NewUser, ServiceCatalog, UserDirectory,
    },
};

use super::{SchedulingEngine, Stores};

pub const BUSINESS: &str = "Beauty Touch Nails";

pub fn at(date: &str, time: &str) -> NaiveDateTime {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    date.and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
}

pub fn utc(date: &str, time: &str) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at(date, time))
}

pub struct TestContext {
    pub stores: Stores,
    pub services: Arc<InMemoryServiceCatalog>,
    pub users: Arc<InMemoryUserDirectory>,
    pub clock: Arc<ManualClock>,
    pub notifier: RecordingNotifier,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let services = Arc::new(InMemoryServiceCatalog::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let stores = Stores::new(
            Arc::new(InMemoryAppointmentStorage::new()),
            services.clone(),
            users.clone(),
            Arc::new(InMemoryPromotionCatalog::new()),
        );

        Self {
            stores,
            services,
            users,
            clock: Arc::new(ManualClock::new(utc("2025-06-01", "08:00"))),
            notifier,
        }
    }

    pub fn engine(&self) -> (SchedulingEngine, NotificationWorker) {
        let (sender, worker) = start_notification_queue(Arc::new(self.notifier.clone()), 16);
        let engine = SchedulingEngine::new(self.stores.clone(), sender, self.clock.clone(), BUSINESS);
        (engine, worker)
    }

    pub async fn service(&self, name: &str) -> Service {
        self.services
            .insert(NewService {
                name: name.to_string(),
                description: format!("{name} at the salon"),
                price: 25.0,
                duration_minutes: 60,
                image_ref: None,
            })
            .await
            .unwrap()
    }

    pub async fn customer(&self, phone: &str) -> User {
        self.users
            .create(NewUser {
                name: "Ana".to_string(),
                phone: phone.to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap()
    }

    pub async fn deactivate(&self, id: ServiceId) {
        self.services.deactivate(id).await.unwrap();
    }
}
