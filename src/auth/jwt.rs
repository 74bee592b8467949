/// Access token issuance and verification
///
/// Access tokens are HS256-signed JWTs. Verification is stateless: a
/// signature check plus claim checks against the injected clock, with no
/// store lookup.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::clock::Clock;
use crate::configuration::JwtSettings;
use crate::error::AuthError;

/// Signs and verifies access tokens with the process-wide secret.
///
/// Keys are derived once at construction and shared read-only.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl AccessTokenCodec {
    pub fn new(settings: &JwtSettings, clock: Arc<dyn Clock>) -> Self {
        let secret = settings.secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Time windows are checked against the injected clock in `verify`
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }

    /// Issue an access token for `user_id` valid for `ttl`
    ///
    /// The TTL is used as given; callers are responsible for clamping it.
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(user_id, self.clock.now(), ttl)?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    /// Verify an access token and return the user it was issued to
    ///
    /// # Errors
    /// - `TokenInvalid`: bad signature, wrong shape, or issued in the future
    /// - `TokenIssuerMismatch`: issuer is not this service
    /// - `TokenExpired`: the expiry has passed
    /// - `MalformedSubject`: subject is not a user ID
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT decoding failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidIssuer => AuthError::TokenIssuerMismatch,
                    _ => AuthError::TokenInvalid,
                }
            })?;

        if claims.iss != ISSUER {
            return Err(AuthError::TokenIssuerMismatch);
        }

        let now = self.clock.now();
        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }
        if claims.is_issued_after(now) {
            return Err(AuthError::TokenInvalid);
        }

        claims.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use chrono::Utc;

    fn settings(secret: &str) -> JwtSettings {
        JwtSettings {
            secret: secret.to_string(),
        }
    }

    fn codec_with_clock(secret: &str) -> (AccessTokenCodec, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new(Utc::now()));
        let codec = AccessTokenCodec::new(&settings(secret), clock.clone());
        (codec, clock)
    }

    fn sign_raw(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to sign claims")
    }

    #[test]
    fn test_issue_and_verify_token() {
        let (codec, _) = codec_with_clock("test-secret");
        let user_id = Uuid::new_v4();

        for ttl in [1, 30, 3600] {
            let token = codec
                .issue(user_id, Duration::seconds(ttl))
                .expect("Failed to issue token");
            assert_eq!(codec.verify(&token).expect("Failed to verify token"), user_id);
        }
    }

    #[test]
    fn test_expired_token() {
        let (codec, clock) = codec_with_clock("test-secret");
        let token = codec.issue(Uuid::new_v4(), Duration::seconds(60)).unwrap();

        clock.advance(Duration::seconds(59));
        assert!(codec.verify(&token).is_ok());

        clock.advance(Duration::seconds(2));
        assert!(matches!(codec.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_issue_with_unrepresentable_ttl() {
        let (codec, _) = codec_with_clock("test-secret");

        for ttl in [Duration::MAX, Duration::MIN] {
            assert!(matches!(
                codec.issue(Uuid::new_v4(), ttl),
                Err(AuthError::TokenSigning(_))
            ));
        }
    }

    #[test]
    fn test_token_from_the_future() {
        let (codec, clock) = codec_with_clock("test-secret");
        let token = codec.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        clock.advance(Duration::minutes(-5));
        assert!(matches!(codec.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_wrong_secret() {
        let (signer, clock) = codec_with_clock("secret-a");
        let verifier = AccessTokenCodec::new(&settings("secret-b"), clock);
        let token = signer.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        assert!(matches!(verifier.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_invalid_token() {
        let (codec, _) = codec_with_clock("test-secret");

        assert!(matches!(codec.verify("invalid-token"), Err(AuthError::TokenInvalid)));
        assert!(matches!(codec.verify(""), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_tampered_token() {
        let (codec, _) = codec_with_clock("test-secret");
        let token = codec.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        let tampered = format!("{}X", token);
        assert!(matches!(codec.verify(&tampered), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_wrong_issuer() {
        let (codec, clock) = codec_with_clock("test-secret");
        let mut claims = Claims::new(Uuid::new_v4(), clock.now(), Duration::hours(1)).unwrap();
        claims.iss = "someone-else".to_string();

        let token = sign_raw(&claims, "test-secret");
        assert!(matches!(codec.verify(&token), Err(AuthError::TokenIssuerMismatch)));
    }

    #[test]
    fn test_malformed_subject() {
        let (codec, clock) = codec_with_clock("test-secret");
        let mut claims = Claims::new(Uuid::new_v4(), clock.now(), Duration::hours(1)).unwrap();
        claims.sub = "not-a-uuid".to_string();

        let token = sign_raw(&claims, "test-secret");
        assert!(matches!(codec.verify(&token), Err(AuthError::MalformedSubject)));
    }

    #[test]
    fn test_missing_claims_rejected() {
        let (codec, clock) = codec_with_clock("test-secret");
        let partial = serde_json::json!({
            "iss": ISSUER,
            "sub": Uuid::new_v4().to_string(),
            "exp": (clock.now() + Duration::hours(1)).timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &partial,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::TokenInvalid)));
    }
}
