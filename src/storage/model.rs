use chrono::{DateTime, Utc};

use crate::models::{
    appointment::{AppointmentId, AppointmentStatus, BlobRef, SlotTime},
    service::ServiceId,
    user::{Role, UserId},
};

pub struct NewAppointment {
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub scheduled_at: SlotTime,
    pub created_at: DateTime<Utc>,
}

/// Partial update of an appointment. `None` leaves a field untouched.
///
/// The reminder flag can only be raised, never cleared.
#[derive(Default)]
pub struct UpdateAppointment {
    pub id: AppointmentId,
    pub status: Option<AppointmentStatus>,
    pub payment_proof: Option<BlobRef>,
    pub mark_reminder_sent: bool,
}

impl UpdateAppointment {
    pub fn new(id: AppointmentId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

pub struct NewService {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    pub image_ref: Option<String>,
}

pub struct UpdateService {
    pub id: ServiceId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub image_ref: Option<String>,
}

pub struct NewPromotion {
    pub code: String,
    pub discount_percent: f64,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub role: Role,
}
