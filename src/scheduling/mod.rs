mod engine;
pub mod messages;
mod reminder;
#[cfg(test)]
pub(crate) mod test_utils;

pub use engine::{
    AppointmentDetails, BookingStats, PromotionRequest, SchedulingEngine, parse_date, parse_slot,
};
pub use reminder::{ReminderScheduler, ReminderWindow};

use std::sync::Arc;

use crate::storage::{AppointmentStorage, PromotionCatalog, ServiceCatalog, UserDirectory};

/// Storage handles shared by the engine and the reminder scheduler.
#[derive(Clone)]
pub struct Stores {
    pub appointments: Arc<dyn AppointmentStorage>,
    pub services: Arc<dyn ServiceCatalog>,
    pub users: Arc<dyn UserDirectory>,
    pub promotions: Arc<dyn PromotionCatalog>,
}

impl Stores {
    pub fn new(
        appointments: Arc<dyn AppointmentStorage>,
        services: Arc<dyn ServiceCatalog>,
        users: Arc<dyn UserDirectory>,
        promotions: Arc<dyn PromotionCatalog>,
    ) -> Self {
        Self {
            appointments,
            services,
            users,
            promotions,
        }
    }
}
