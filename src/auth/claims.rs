/// JWT Claims structure
///
/// Registered claims (RFC 7519) carried by an access token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Fixed issuer stamped into every access token
pub const ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// # Errors
    /// Returns `TokenSigning` if `issued_at + ttl` is out of range
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Result<Self, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::TokenSigning("token expiry out of range".to_string()))?;

        Ok(Self {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Parse the subject back into a user ID
    ///
    /// # Errors
    /// Returns `MalformedSubject` if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::MalformedSubject)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    pub fn is_issued_after(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() < self.iat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = Claims::new(user_id, now, Duration::seconds(3600)).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), now, Duration::seconds(60)).unwrap();

        assert!(!claims.is_expired_at(now + Duration::seconds(60)));
        assert!(claims.is_expired_at(now + Duration::seconds(61)));
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims =
            Claims::new(Uuid::new_v4(), Utc::now(), Duration::seconds(3600)).unwrap();
        claims.sub = "invalid-uuid".to_string();

        assert!(matches!(claims.user_id(), Err(AuthError::MalformedSubject)));
    }

    #[test]
    fn test_expiry_out_of_range() {
        let result = Claims::new(Uuid::new_v4(), Utc::now(), Duration::MAX);

        assert!(matches!(result, Err(AuthError::TokenSigning(_))));
    }
}
