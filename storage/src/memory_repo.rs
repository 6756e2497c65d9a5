//! In-memory [`UserStore`]; for tests and bots that do not need durable users.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::models::UserRecord;
use crate::repository::UserStore;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<i64, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub async fn get_user(&self, id: i64) -> Option<UserRecord> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_all_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StorageError> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }
}
