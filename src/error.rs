use thiserror::Error;

use crate::storage::StorageError;

/// Failures surfaced to the API layer.
///
/// Notification failures never appear here; they are logged where they
/// happen.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Slot already booked")]
    Conflict,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error")]
    Internal(#[source] StorageError),
}

impl From<StorageError> for BookingError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::SlotTaken => BookingError::Conflict,
            other => {
                log::error!("Storage failure: {}", other);
                BookingError::Internal(other)
            }
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
