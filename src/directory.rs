use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::{Space, UserProfile};
use crate::store::StoreError;

/// Read side of the space catalog. Space lifecycle is managed elsewhere;
/// the engine only validates bookability and resolves hoster ownership.
#[async_trait]
pub trait SpaceDirectory: Send + Sync {
    async fn lookup(&self, space_id: &str) -> Result<Option<Space>, StoreError>;

    /// Every space whose `hoster` field matches the given host.
    async fn query_by_hoster(&self, hoster_id: &str) -> Result<Vec<Space>, StoreError>;
}

/// Read side of the user table. Missing users are absent entries, not errors.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Point-lookup a batch of users. Callers chunk the id list; a backend
    /// may still cap the batch size below the caller's chunk.
    async fn batch_lookup(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, UserProfile>, StoreError>;
}

#[derive(Default)]
pub struct MemorySpaceDirectory {
    spaces: DashMap<String, Space>,
}

impl MemorySpaceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, space: Space) {
        self.spaces.insert(space.space_id.clone(), space);
    }
}

#[async_trait]
impl SpaceDirectory for MemorySpaceDirectory {
    async fn lookup(&self, space_id: &str) -> Result<Option<Space>, StoreError> {
        Ok(self.spaces.get(space_id).map(|e| e.value().clone()))
    }

    async fn query_by_hoster(&self, hoster_id: &str) -> Result<Vec<Space>, StoreError> {
        let mut found: Vec<Space> = self
            .spaces
            .iter()
            .filter(|e| e.hoster == hoster_id)
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| a.space_id.cmp(&b.space_id));
        Ok(found)
    }
}

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: DashMap<String, UserProfile>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, user: UserProfile) {
        self.users.insert(user.user_id.clone(), user);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.get(user_id).map(|e| e.value().clone()))
    }

    async fn batch_lookup(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, UserProfile>, StoreError> {
        let mut found = HashMap::new();
        for id in user_ids {
            if let Some(user) = self.users.get(id) {
                found.insert(id.clone(), user.value().clone());
            }
        }
        Ok(found)
    }
}
