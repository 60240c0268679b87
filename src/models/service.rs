use serde::Serialize;

pub type ServiceId = i64;

/// A bookable salon service.
///
/// `duration_minutes` is shown to customers only. Bookings never check it
/// for overlaps.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    pub image_ref: Option<String>,
    pub active: bool,
}
