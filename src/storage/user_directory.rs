use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::user::{User, UserId};

use super::{NewUser, StorageError};

/// Lookup of customer contact details. Registration and credentials live
/// with the auth layer; this only resolves who to notify.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, StorageError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StorageError>;
}

pub struct InMemoryUserDirectory {
    store: RwLock<(UserId, HashMap<UserId, User>)>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        InMemoryUserDirectory {
            store: RwLock::new((1, HashMap::new())),
        }
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StorageError> {
        let NewUser { name, phone, role } = new_user;
        let mut store = self.store.write().await;
        let id = store.0;
        let user = User {
            id,
            name,
            phone,
            role,
        };

        store.1.insert(id, user.clone());
        store.0 += 1;

        Ok(user)
    }
}
