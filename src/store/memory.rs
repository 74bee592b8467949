/// In-process repositories
///
/// All tables live behind one mutex, so cascading deletes and token
/// revocation are atomic with respect to every other operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    Chirp, ChirpRepository, RefreshToken, RefreshTokenRepository, StoreError, User,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
    chirps: Vec<Chirp>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables();
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate(format!("email {}", email)));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::Duplicate(format!("email {}", email)));
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert(&self, token: &RefreshToken) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if !tables.users.contains_key(&token.user_id) {
            return Err(StoreError::ForeignKey(format!("user {}", token.user_id)));
        }
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(StoreError::Duplicate("refresh token".to_string()));
        }

        tables
            .refresh_tokens
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self.tables().refresh_tokens.get(token).cloned())
    }

    async fn revoke(&self, token: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        match tables.refresh_tokens.get_mut(token) {
            Some(record) => {
                record.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reset_all(&self) -> Result<(), StoreError> {
        let mut tables = self.tables();
        *tables = Tables::default();
        Ok(())
    }
}

#[async_trait]
impl ChirpRepository for MemoryStore {
    async fn create(&self, body: &str, user_id: Uuid) -> Result<Chirp, StoreError> {
        let mut tables = self.tables();
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::ForeignKey(format!("user {}", user_id)));
        }

        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        tables.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn list(&self) -> Result<Vec<Chirp>, StoreError> {
        Ok(self.tables().chirps.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Chirp>, StoreError> {
        Ok(self.tables().chirps.iter().find(|c| c.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        let before = tables.chirps.len();
        tables.chirps.retain(|c| c.id != id);
        Ok(tables.chirps.len() < before)
    }
}
