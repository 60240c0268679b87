use chrono::{DateTime, Utc};
use serde::Serialize;

pub type PromotionId = i64;

/// A discount code advertised by the salon.
#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub code: String,
    pub discount_percent: f64,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Promotion {
    /// Listed until its end date passes or it is withdrawn. Promotions that
    /// have not started yet are listed too, so customers see them coming.
    pub fn is_listed(&self, now: DateTime<Utc>) -> bool {
        self.active && self.ends_at >= now
    }
}
