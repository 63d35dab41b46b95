use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::accounts::repo::{StoreError, StoreResult, UserRepository};
use crate::accounts::repo_types::{NewUser, User};

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    by_handle: HashMap<String, i64>,
}

/// Process-local user store. Uniqueness checks and writes share one lock.
#[derive(Default)]
pub struct InMemoryUserRepository {
    tables: RwLock<Tables>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_handle(&self, login_handle: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_handle
            .get(login_handle)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.by_handle.contains_key(&user.login_handle) {
            return Err(StoreError::UniqueViolation);
        }

        tables.last_id += 1;
        let stored = User {
            id: tables.last_id,
            name: user.name,
            login_handle: user.login_handle,
            password_hash: user.password_hash,
            photo_url: user.photo_url,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.by_handle.insert(stored.login_handle.clone(), stored.id);
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn replace(&self, user: &User) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.users.get(&user.id).cloned() else {
            return Ok(None);
        };

        if current.login_handle != user.login_handle {
            if tables.by_handle.contains_key(&user.login_handle) {
                return Err(StoreError::UniqueViolation);
            }
            tables.by_handle.remove(&current.login_handle);
            tables.by_handle.insert(user.login_handle.clone(), user.id);
        }

        let stored = User {
            created_at: current.created_at,
            ..user.clone()
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }
}
