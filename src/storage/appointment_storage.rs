use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{
    appointment::{Appointment, AppointmentId, AppointmentStatus, SlotTime},
    service::ServiceId,
    user::UserId,
};

use super::{NewAppointment, StorageError, UpdateAppointment};

/// Canonical owner of appointment records.
///
/// `insert` is a conditional insert: implementations must reject a new
/// appointment with [`StorageError::SlotTaken`] when an active appointment
/// already holds the same service and timestamp, atomically with respect to
/// other inserts. `update` enforces the same rule when it reactivates a
/// cancelled appointment.
#[async_trait]
pub trait AppointmentStorage: Send + Sync {
    async fn find_conflict(
        &self,
        service_id: ServiceId,
        scheduled_at: &SlotTime,
    ) -> Result<Option<Appointment>, StorageError>;
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StorageError>;
    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, StorageError>;
    /// Returns the number of matched records (0 or 1).
    async fn update(&self, update: UpdateAppointment) -> Result<u64, StorageError>;
    async fn get_pending_reminders(&self) -> Result<Vec<Appointment>, StorageError>;
    async fn get_active_service_appointments(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<Appointment>, StorageError>;
    async fn get_all_user_appointments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Appointment>, StorageError>;
    async fn get_all(&self) -> Result<Vec<Appointment>, StorageError>;
}

struct InMemoryAppointmentStore {
    current_id: AppointmentId,
    appointments: BTreeMap<AppointmentId, Appointment>,
}

impl InMemoryAppointmentStore {
    fn slot_holder(&self, service_id: ServiceId, scheduled_at: &SlotTime) -> Option<&Appointment> {
        self.appointments
            .values()
            .find(|a| a.occupies(service_id, scheduled_at))
    }
}

pub struct InMemoryAppointmentStorage {
    store: RwLock<InMemoryAppointmentStore>,
}

impl InMemoryAppointmentStorage {
    pub fn new() -> Self {
        InMemoryAppointmentStorage {
            store: RwLock::new(InMemoryAppointmentStore {
                current_id: 1,
                appointments: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryAppointmentStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentStorage for InMemoryAppointmentStorage {
    async fn find_conflict(
        &self,
        service_id: ServiceId,
        scheduled_at: &SlotTime,
    ) -> Result<Option<Appointment>, StorageError> {
        let store = self.store.read().await;
        Ok(store.slot_holder(service_id, scheduled_at).cloned())
    }

    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StorageError> {
        let mut store = self.store.write().await;
        if store
            .slot_holder(appointment.service_id, &appointment.scheduled_at)
            .is_some()
        {
            return Err(StorageError::SlotTaken);
        }

        let id = store.current_id;
        let created = Appointment {
            id,
            user_id: appointment.user_id,
            service_id: appointment.service_id,
            scheduled_at: appointment.scheduled_at,
            status: AppointmentStatus::Pending,
            payment_proof: None,
            reminder_sent: false,
            created_at: appointment.created_at,
        };

        store.appointments.insert(id, created.clone());
        store.current_id += 1;
        log::debug!("Stored appointment [appointment_id = {}]", id);

        Ok(created)
    }

    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, StorageError> {
        let store = self.store.read().await;
        Ok(store.appointments.get(&id).cloned())
    }

    async fn update(&self, update: UpdateAppointment) -> Result<u64, StorageError> {
        let mut store = self.store.write().await;
        let Some(current) = store.appointments.get(&update.id) else {
            return Ok(0);
        };

        let reactivates = !current.status.is_active()
            && update.status.is_some_and(|status| status.is_active());
        if reactivates {
            let (service_id, scheduled_at) = (current.service_id, current.scheduled_at);
            if store.slot_holder(service_id, &scheduled_at).is_some() {
                return Err(StorageError::SlotTaken);
            }
        }

        let Some(appointment) = store.appointments.get_mut(&update.id) else {
            return Ok(0);
        };
        if let Some(status) = update.status {
            appointment.status = status;
        }
        if let Some(payment_proof) = update.payment_proof {
            appointment.payment_proof = Some(payment_proof);
        }
        if update.mark_reminder_sent {
            appointment.reminder_sent = true;
        }

        Ok(1)
    }

    async fn get_pending_reminders(&self) -> Result<Vec<Appointment>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .appointments
            .values()
            .filter(|a| a.awaits_reminder())
            .cloned()
            .collect())
    }

    async fn get_active_service_appointments(
        &self,
        service_id: ServiceId,
    ) -> Result<Vec<Appointment>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .appointments
            .values()
            .filter(|a| a.service_id == service_id && a.status.is_active())
            .cloned()
            .collect())
    }

    async fn get_all_user_appointments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Appointment>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .appointments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_all(&self) -> Result<Vec<Appointment>, StorageError> {
        let store = self.store.read().await;
        Ok(store.appointments.values().cloned().collect())
    }
}
