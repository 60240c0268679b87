use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::promotion::{Promotion, PromotionId};

use super::{NewPromotion, StorageError};

#[async_trait]
pub trait PromotionCatalog: Send + Sync {
    async fn get(&self, id: PromotionId) -> Result<Option<Promotion>, StorageError>;
    /// Promotions that are active and have not ended by `now`.
    async fn get_active(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, StorageError>;
    async fn insert(&self, promotion: NewPromotion) -> Result<Promotion, StorageError>;
    /// Soft delete.
    async fn deactivate(&self, id: PromotionId) -> Result<(), StorageError>;
}

pub struct InMemoryPromotionCatalog {
    store: RwLock<(PromotionId, BTreeMap<PromotionId, Promotion>)>,
}

impl InMemoryPromotionCatalog {
    pub fn new() -> Self {
        InMemoryPromotionCatalog {
            store: RwLock::new((1, BTreeMap::new())),
        }
    }
}

impl Default for InMemoryPromotionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromotionCatalog for InMemoryPromotionCatalog {
    async fn get(&self, id: PromotionId) -> Result<Option<Promotion>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }

    async fn get_active(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .1
            .values()
            .filter(|p| p.is_listed(now))
            .cloned()
            .collect())
    }

    async fn insert(&self, promotion: NewPromotion) -> Result<Promotion, StorageError> {
        let mut store = self.store.write().await;
        let id = store.0;
        let created = Promotion {
            id,
            code: promotion.code,
            discount_percent: promotion.discount_percent,
            description: promotion.description,
            starts_at: promotion.starts_at,
            ends_at: promotion.ends_at,
            active: true,
            created_at: promotion.created_at,
        };

        store.1.insert(id, created.clone());
        store.0 += 1;
        log::info!(
            "Created promotion [promotion_id = {}, code = {}]",
            id,
            created.code
        );

        Ok(created)
    }

    async fn deactivate(&self, id: PromotionId) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        let promotion = store.1.get_mut(&id).ok_or(StorageError::NotFound(id))?;
        promotion.active = false;
        log::info!("Deactivated promotion [promotion_id = {}]", id);

        Ok(())
    }
}
