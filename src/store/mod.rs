/// Persistence layer
///
/// Repository traits consumed by the session core and the request handlers,
/// with a PostgreSQL implementation and an in-process one for tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("missing referenced record: {0}")]
    ForeignKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Backend(String),
}

/// Stored user account
///
/// Carries the password hash, so it is never serialized directly;
/// handlers respond with [`UserProfile`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing view of a user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email.clone(),
        }
    }
}

/// Persisted refresh token. The token string is the record key.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `None` while the token is active; set once and never cleared.
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, StoreError>;

    /// Replaces the email and password hash of an existing user.
    async fn update_password(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, StoreError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Fails loudly with [`StoreError::Duplicate`] on a key collision,
    /// never overwriting an existing record.
    async fn insert(&self, token: &RefreshToken) -> Result<(), StoreError>;

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Sets `revoked_at` if it is not already set, as a single atomic update.
    /// Returns `false` when no record matches.
    async fn revoke(&self, token: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Deletes every user together with their tokens and chirps.
    async fn reset_all(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create(&self, body: &str, user_id: Uuid) -> Result<Chirp, StoreError>;

    /// All chirps, oldest first.
    async fn list(&self) -> Result<Vec<Chirp>, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Chirp>, StoreError>;

    /// Returns `false` when no chirp matched.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
