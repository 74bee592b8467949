/// Refresh Token Management
///
/// Refresh tokens are opaque 256-bit random values, hex encoded, persisted
/// with an expiry and a nullable revocation timestamp. They are never
/// rotated: one token stays usable until it expires or is revoked.

use chrono::Duration;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::configuration::Platform;
use crate::error::AuthError;
use crate::store::{RefreshToken, RefreshTokenRepository};

const TOKEN_BYTES: usize = 32;

/// Lifetime of a refresh token from the moment it is issued
pub fn refresh_token_ttl() -> Duration {
    Duration::days(60)
}

/// Generate a new cryptographically secure refresh token string
pub fn generate_refresh_token() -> Result<String, AuthError> {
    let mut data = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut data)
        .map_err(|e| AuthError::RandomSource(e.to_string()))?;
    Ok(hex::encode(data))
}

/// Short SHA-256 fingerprint used in place of the token in logs
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
    clock: Arc<dyn Clock>,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Mint and persist a refresh token for `user_id`
    ///
    /// # Errors
    /// Fails if the random source or the insert fails. A key collision
    /// surfaces as a store error rather than overwriting.
    pub async fn issue(&self, user_id: Uuid) -> Result<RefreshToken, AuthError> {
        let now = self.clock.now();
        let record = RefreshToken {
            token: generate_refresh_token()?,
            user_id,
            created_at: now,
            expires_at: now + refresh_token_ttl(),
            revoked_at: None,
        };

        self.repository.insert(&record).await?;

        tracing::debug!(
            user_id = %user_id,
            token = %token_fingerprint(&record.token),
            "Refresh token issued"
        );
        Ok(record)
    }

    pub async fn get(&self, token: &str) -> Result<RefreshToken, AuthError> {
        self.repository
            .find(token)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Validate a refresh token and return its owner
    ///
    /// # Errors
    /// `NotFound`, then `Expired` (now at or past expiry), then `Revoked`
    pub async fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        let record = self.get(token).await?;

        if self.clock.now() >= record.expires_at {
            tracing::info!(
                user_id = %record.user_id,
                token = %token_fingerprint(token),
                "Refresh token expired"
            );
            return Err(AuthError::Expired);
        }

        if record.revoked_at.is_some() {
            tracing::warn!(
                user_id = %record.user_id,
                token = %token_fingerprint(token),
                "Attempt to use revoked refresh token"
            );
            return Err(AuthError::Revoked);
        }

        Ok(record.user_id)
    }

    /// Mark a refresh token revoked. Revoking an already revoked token
    /// succeeds and keeps the original revocation time.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let matched = self.repository.revoke(token, self.clock.now()).await?;
        if !matched {
            return Err(AuthError::NotFound);
        }

        tracing::info!(token = %token_fingerprint(token), "Refresh token revoked");
        Ok(())
    }

    /// Delete all users and their tokens. Only permitted on the dev platform.
    pub async fn reset_all(&self, platform: Platform) -> Result<(), AuthError> {
        if platform != Platform::Dev {
            tracing::warn!(platform = ?platform, "Reset refused outside dev platform");
            return Err(AuthError::ResetForbidden);
        }

        self.repository.reset_all().await?;
        Ok(())
    }
}
