use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::{
    clock::Clock,
    delivery::{Notification, NotificationSender},
    error::{BookingError, BookingResult},
    models::{
        appointment::{Appointment, AppointmentId, AppointmentStatus, BlobRef, SlotTime},
        promotion::{Promotion, PromotionId},
        service::{Service, ServiceId},
        user::{Role, User, UserId},
    },
    storage::{
        AppointmentStorage, NewAppointment, NewPromotion, PromotionCatalog, ServiceCatalog,
        StorageError, UpdateAppointment, UserDirectory,
    },
};

use super::{Stores, messages};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Admin input for a new promotion.
#[derive(Debug, Clone)]
pub struct PromotionRequest {
    pub code: String,
    pub discount_percent: f64,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// An appointment joined with what it refers to, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub service: Option<Service>,
    pub customer: Option<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookingStats {
    pub total_appointments: usize,
    pub pending_appointments: usize,
    pub confirmed_appointments: usize,
    pub active_services: usize,
}

pub struct SchedulingEngine {
    stores: Stores,
    notifications: NotificationSender,
    clock: Arc<dyn Clock>,
    business_name: String,
    prefer_rich_channel: bool,
}

impl SchedulingEngine {
    pub fn new(
        stores: Stores,
        notifications: NotificationSender,
        clock: Arc<dyn Clock>,
        business_name: impl Into<String>,
    ) -> Self {
        Self {
            stores,
            notifications,
            clock,
            business_name: business_name.into(),
            prefer_rich_channel: false,
        }
    }

    /// Confirmations go out over the plain channel unless asked otherwise.
    pub fn with_rich_confirmations(mut self, prefer_rich_channel: bool) -> Self {
        self.prefer_rich_channel = prefer_rich_channel;
        self
    }

    pub async fn book_appointment(
        &self,
        user_id: UserId,
        service_id: ServiceId,
        date: &str,
        time: &str,
    ) -> BookingResult<Appointment> {
        let scheduled_at = parse_slot(date, time)?;
        let service = self
            .stores
            .services
            .get(service_id)
            .await?
            .filter(|s| s.active)
            .ok_or(BookingError::NotFound("service"))?;

        if let Some(existing) = self
            .stores
            .appointments
            .find_conflict(service_id, &scheduled_at)
            .await?
        {
            log::info!(
                "Rejecting booking for taken slot. [service_id = {}, scheduled_at = {}, holder = {}]",
                service_id,
                scheduled_at.datetime(),
                existing.id
            );
            return Err(BookingError::Conflict);
        }

        // The store re-checks the slot atomically; a lost race surfaces as Conflict.
        let appointment = self
            .stores
            .appointments
            .insert(NewAppointment {
                user_id,
                service_id,
                scheduled_at,
                created_at: self.clock.now(),
            })
            .await?;

        log::info!(
            "Booked appointment. [appointment_id = {}, user_id = {}, service_id = {}, scheduled_at = {}]",
            appointment.id,
            user_id,
            service_id,
            scheduled_at.datetime()
        );

        self.send_confirmation(&appointment, service);

        Ok(appointment)
    }

    fn send_confirmation(&self, appointment: &Appointment, service: Service) {
        let users = Arc::clone(&self.stores.users);
        let notifications = self.notifications.clone();
        let message =
            messages::booking_confirmation(&self.business_name, &service, &appointment.scheduled_at);
        let prefer_rich_channel = self.prefer_rich_channel;
        let (appointment_id, user_id) = (appointment.id, appointment.user_id);

        tokio::spawn(async move {
            match users.get(user_id).await {
                Ok(Some(user)) => notifications.enqueue(Notification {
                    phone: user.phone,
                    message,
                    prefer_rich_channel,
                }),
                Ok(None) => log::warn!(
                    "No customer to confirm booking to. [appointment_id = {}, user_id = {}]",
                    appointment_id,
                    user_id
                ),
                Err(error) => log::error!(
                    "Could not resolve customer for confirmation. [appointment_id = {}, error = {}]",
                    appointment_id,
                    error
                ),
            }
        });
    }

    /// Attaches the proof and confirms the appointment, whatever its status.
    ///
    /// Fails with `NotFound` when the appointment is missing or belongs to
    /// someone else, and with `Conflict` when a cancelled appointment would
    /// be reactivated into a slot that has been booked again since.
    pub async fn upload_payment_proof(
        &self,
        appointment_id: AppointmentId,
        requester_id: UserId,
        payment_proof: BlobRef,
    ) -> BookingResult<Appointment> {
        self.stores
            .appointments
            .get(appointment_id)
            .await?
            .filter(|a| a.user_id == requester_id)
            .ok_or(BookingError::NotFound("appointment"))?;

        let mut update = UpdateAppointment::new(appointment_id);
        update.status = Some(AppointmentStatus::Confirmed);
        update.payment_proof = Some(payment_proof);
        if self.stores.appointments.update(update).await? == 0 {
            return Err(BookingError::NotFound("appointment"));
        }

        log::info!(
            "Payment proof attached. [appointment_id = {}]",
            appointment_id
        );

        self.stores
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(BookingError::NotFound("appointment"))
    }

    /// Any status may move to any other. Reactivating a cancelled
    /// appointment whose slot was rebooked fails with `Conflict`.
    pub async fn update_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> BookingResult<()> {
        let mut update = UpdateAppointment::new(appointment_id);
        update.status = Some(status);

        if self.stores.appointments.update(update).await? == 0 {
            return Err(BookingError::NotFound("appointment"));
        }

        log::info!(
            "Appointment status updated. [appointment_id = {}, status = {}]",
            appointment_id,
            status
        );
        Ok(())
    }

    /// Times of day already taken for `service_id` on `date`.
    pub async fn compute_availability(
        &self,
        service_id: ServiceId,
        date: &str,
    ) -> BookingResult<BTreeSet<NaiveTime>> {
        let date = parse_date(date)?;
        let occupied = self
            .stores
            .appointments
            .get_active_service_appointments(service_id)
            .await?
            .into_iter()
            .map(|a| a.scheduled_at.into_datetime())
            .filter(|at| at.date() == date)
            .map(|at| at.time())
            .collect();

        Ok(occupied)
    }

    /// Customers see their own appointments; admins see everyone's along
    /// with the customer record.
    pub async fn list_appointments(
        &self,
        viewer_id: UserId,
        role: Role,
    ) -> BookingResult<Vec<AppointmentDetails>> {
        let appointments = match role {
            Role::Admin => self.stores.appointments.get_all().await?,
            Role::Customer => {
                self.stores
                    .appointments
                    .get_all_user_appointments(viewer_id)
                    .await?
            }
        };

        let mut details = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let service = self.stores.services.get(appointment.service_id).await?;
            let customer = match role {
                Role::Admin => self.stores.users.get(appointment.user_id).await?,
                Role::Customer => None,
            };
            details.push(AppointmentDetails {
                appointment,
                service,
                customer,
            });
        }

        Ok(details)
    }

    pub async fn stats(&self) -> BookingResult<BookingStats> {
        let appointments = self.stores.appointments.get_all().await?;
        let count = |status: AppointmentStatus| {
            appointments.iter().filter(|a| a.status == status).count()
        };

        Ok(BookingStats {
            total_appointments: appointments.len(),
            pending_appointments: count(AppointmentStatus::Pending),
            confirmed_appointments: count(AppointmentStatus::Confirmed),
            active_services: self.stores.services.get_all_active().await?.len(),
        })
    }

    pub async fn create_promotion(&self, request: PromotionRequest) -> BookingResult<Promotion> {
        let code = request.code.trim();
        if code.is_empty() {
            return Err(BookingError::Validation("promotion code is empty".to_string()));
        }
        if !(request.discount_percent > 0.0 && request.discount_percent <= 100.0) {
            return Err(BookingError::Validation(format!(
                "discount must be within (0, 100], got {}",
                request.discount_percent
            )));
        }
        if request.starts_at > request.ends_at {
            return Err(BookingError::Validation(
                "promotion ends before it starts".to_string(),
            ));
        }

        let promotion = self
            .stores
            .promotions
            .insert(NewPromotion {
                code: code.to_string(),
                discount_percent: request.discount_percent,
                description: request.description,
                starts_at: request.starts_at,
                ends_at: request.ends_at,
                created_at: self.clock.now(),
            })
            .await?;

        Ok(promotion)
    }

    /// Promotions still running (or upcoming) at the current time.
    pub async fn active_promotions(&self) -> BookingResult<Vec<Promotion>> {
        Ok(self.stores.promotions.get_active(self.clock.now()).await?)
    }

    pub async fn deactivate_promotion(&self, promotion_id: PromotionId) -> BookingResult<()> {
        match self.stores.promotions.deactivate(promotion_id).await {
            Err(StorageError::NotFound(_)) => Err(BookingError::NotFound("promotion")),
            other => Ok(other?),
        }
    }
}

pub fn parse_date(date: &str) -> BookingResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| BookingError::Validation(format!("invalid date {date:?}")))
}

pub fn parse_slot(date: &str, time: &str) -> BookingResult<SlotTime> {
    let date = parse_date(date)?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(time.trim(), format).ok())
        .ok_or_else(|| BookingError::Validation(format!("invalid time {time:?}")))?;

    Ok(SlotTime::new(date.and_time(time)))
}
