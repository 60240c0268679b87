mod appointment_storage;
mod model;
mod promotion_catalog;
mod service_catalog;
mod user_directory;

pub use appointment_storage::{AppointmentStorage, InMemoryAppointmentStorage};
pub use model::{
    NewAppointment, NewPromotion, NewService, NewUser, UpdateAppointment, UpdateService,
};
pub use promotion_catalog::{InMemoryPromotionCatalog, PromotionCatalog};
pub use service_catalog::{InMemoryServiceCatalog, ServiceCatalog};
pub use user_directory::{InMemoryUserDirectory, UserDirectory};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Another active appointment already holds this slot")]
    SlotTaken,

    #[error("Record does not exist {0}")]
    NotFound(i64),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}
