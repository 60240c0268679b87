use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::service::{Service, ServiceId};

use super::{NewService, StorageError, UpdateService};

#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn get(&self, id: ServiceId) -> Result<Option<Service>, StorageError>;
    async fn get_all_active(&self) -> Result<Vec<Service>, StorageError>;
    async fn insert(&self, service: NewService) -> Result<Service, StorageError>;
    async fn update(&self, service: UpdateService) -> Result<Service, StorageError>;
    /// Soft delete. The service stays resolvable for existing appointments.
    async fn deactivate(&self, id: ServiceId) -> Result<(), StorageError>;
}

pub struct InMemoryServiceCatalog {
    store: RwLock<(ServiceId, BTreeMap<ServiceId, Service>)>,
}

impl InMemoryServiceCatalog {
    pub fn new() -> Self {
        InMemoryServiceCatalog {
            store: RwLock::new((1, BTreeMap::new())),
        }
    }
}

impl Default for InMemoryServiceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryServiceCatalog {
    async fn get(&self, id: ServiceId) -> Result<Option<Service>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }

    async fn get_all_active(&self) -> Result<Vec<Service>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.values().filter(|s| s.active).cloned().collect())
    }

    async fn insert(&self, service: NewService) -> Result<Service, StorageError> {
        let mut store = self.store.write().await;
        let id = store.0;
        let created = Service {
            id,
            name: service.name,
            description: service.description,
            price: service.price,
            duration_minutes: service.duration_minutes,
            image_ref: service.image_ref,
            active: true,
        };

        store.1.insert(id, created.clone());
        store.0 += 1;
        log::info!("Created service [service_id = {}, name = {}]", id, created.name);

        Ok(created)
    }

    async fn update(&self, update: UpdateService) -> Result<Service, StorageError> {
        let mut store = self.store.write().await;
        let service = store
            .1
            .get_mut(&update.id)
            .ok_or(StorageError::NotFound(update.id))?;

        service.name = update.name.unwrap_or(std::mem::take(&mut service.name));
        service.description = update
            .description
            .unwrap_or(std::mem::take(&mut service.description));
        service.price = update.price.unwrap_or(service.price);
        service.duration_minutes = update.duration_minutes.unwrap_or(service.duration_minutes);
        if update.image_ref.is_some() {
            service.image_ref = update.image_ref;
        }

        Ok(service.clone())
    }

    async fn deactivate(&self, id: ServiceId) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        let service = store.1.get_mut(&id).ok_or(StorageError::NotFound(id))?;
        service.active = false;
        log::info!("Deactivated service [service_id = {}]", id);

        Ok(())
    }
}
