use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::Serialize;

use crate::models::{service::ServiceId, user::UserId};

pub type AppointmentId = i64;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown appointment status {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Wall-clock moment of an appointment, in the salon's local time.
///
/// Seconds and below are dropped so that two requests for "10:00" always
/// land on the same slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SlotTime(NaiveDateTime);

impl SlotTime {
    pub fn new(inner: NaiveDateTime) -> Self {
        let normalized = inner
            .with_nanosecond(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(inner);
        Self(normalized)
    }

    pub fn datetime(&self) -> &NaiveDateTime {
        &self.0
    }

    pub fn into_datetime(self) -> NaiveDateTime {
        self.0
    }
}

/// Opaque reference to uploaded content, produced by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub scheduled_at: SlotTime,
    pub status: AppointmentStatus,
    pub payment_proof: Option<BlobRef>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn occupies(&self, service_id: ServiceId, scheduled_at: &SlotTime) -> bool {
        self.status.is_active()
            && self.service_id == service_id
            && self.scheduled_at == *scheduled_at
    }

    pub fn awaits_reminder(&self) -> bool {
        self.status.is_active() && !self.reminder_sent
    }
}
