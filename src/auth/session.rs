/// Session orchestration
///
/// Composes password verification, access tokens and refresh tokens into
/// the login, authenticate, refresh and revoke flows used by the handlers.
/// Holds no state of its own beyond its collaborators.

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::bearer;
use crate::auth::jwt::AccessTokenCodec;
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::{token_fingerprint, RefreshTokenStore};
use crate::configuration::Platform;
use crate::error::AuthError;
use crate::store::{RefreshToken, User, UserRepository};

/// Upper bound and default for access token lifetime
pub fn max_access_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Effective TTL for a login request: the requested number of seconds if it
/// lies in (1s, 1h], one hour otherwise.
pub fn effective_ttl(requested_seconds: Option<i64>) -> Duration {
    let max = max_access_token_ttl();
    match requested_seconds {
        Some(seconds) if seconds > 1 && seconds <= max.num_seconds() => Duration::seconds(seconds),
        _ => max,
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

#[derive(Clone)]
pub struct SessionOrchestrator {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    access_tokens: AccessTokenCodec,
    refresh_tokens: RefreshTokenStore,
}

impl SessionOrchestrator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        access_tokens: AccessTokenCodec,
        refresh_tokens: RefreshTokenStore,
    ) -> Self {
        Self {
            users,
            hasher,
            access_tokens,
            refresh_tokens,
        }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Verify credentials and mint an access token plus a refresh token
    ///
    /// # Errors
    /// `InvalidCredentials` for both an unknown email and a wrong password
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_seconds: Option<i64>,
    ) -> Result<LoginSession, AuthError> {
        // Registration stores emails trimmed
        let user = match self.users.find_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                // Same bcrypt work as a wrong password
                self.hasher.spawn_verify_dummy(password.to_string()).await?;
                tracing::debug!("Login for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches = self
            .hasher
            .spawn_verify(password.to_string(), user.hashed_password.clone())
            .await?;
        if !matches {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let ttl = effective_ttl(requested_ttl_seconds);
        let access_token = self.access_tokens.issue(user.id, ttl)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;

        tracing::info!(
            user_id = %user.id,
            ttl_seconds = ttl.num_seconds(),
            "Session opened"
        );

        Ok(LoginSession {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Resolve the user behind an `Authorization` header carrying an access
    /// token
    pub fn authenticate(&self, header_value: Option<&str>) -> Result<Uuid, AuthError> {
        let token = bearer::extract(header_value)?;
        self.access_tokens.verify(token)
    }

    /// Mint a fresh one-hour access token from a refresh token. The refresh
    /// token itself is left untouched.
    pub async fn refresh(&self, header_value: Option<&str>) -> Result<String, AuthError> {
        let token = bearer::extract(header_value)?;
        let user_id = self.refresh_tokens.validate(token).await?;
        let access_token = self.access_tokens.issue(user_id, max_access_token_ttl())?;

        tracing::info!(
            user_id = %user_id,
            token = %token_fingerprint(token),
            "Access token refreshed"
        );
        Ok(access_token)
    }

    pub async fn revoke(&self, header_value: Option<&str>) -> Result<(), AuthError> {
        let token = bearer::extract(header_value)?;
        self.refresh_tokens.revoke(token).await
    }

    pub async fn reset_all(&self, platform: Platform) -> Result<(), AuthError> {
        self.refresh_tokens.reset_all(platform).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::configuration::JwtSettings;
    use crate::store::MemoryStore;
    use chrono::Utc;

    struct Harness {
        sessions: SessionOrchestrator,
        clock: Arc<MockClock>,
        user: User,
    }

    async fn harness() -> Harness {
        harness_with_cost(4).await
    }

    async fn harness_with_cost(cost: u32) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(MockClock::new(Utc::now()));
        let hasher = PasswordHasher::with_cost(cost);

        let hashed = hasher.hash("pw123456").unwrap();
        let user = store.create("a@example.com", &hashed).await.unwrap();

        let settings = JwtSettings {
            secret: "session-test-secret".to_string(),
        };
        let sessions = SessionOrchestrator::new(
            store.clone(),
            hasher,
            AccessTokenCodec::new(&settings, clock.clone()),
            RefreshTokenStore::new(store, clock.clone()),
        );

        Harness {
            sessions,
            clock,
            user,
        }
    }

    fn bearer(token: &str) -> Option<String> {
        Some(format!("Bearer {}", token))
    }

    #[test]
    fn test_effective_ttl() {
        assert_eq!(effective_ttl(None), Duration::hours(1));
        assert_eq!(effective_ttl(Some(0)), Duration::hours(1));
        assert_eq!(effective_ttl(Some(-30)), Duration::hours(1));
        assert_eq!(effective_ttl(Some(1)), Duration::hours(1));
        assert_eq!(effective_ttl(Some(2)), Duration::seconds(2));
        assert_eq!(effective_ttl(Some(600)), Duration::seconds(600));
        assert_eq!(effective_ttl(Some(3600)), Duration::hours(1));
        assert_eq!(effective_ttl(Some(3601)), Duration::hours(1));
        assert_eq!(effective_ttl(Some(i64::MAX)), Duration::hours(1));
    }

    #[tokio::test]
    async fn test_full_session_lifecycle() {
        let h = harness().await;

        let session = h
            .sessions
            .login("a@example.com", "pw123456", None)
            .await
            .expect("Login failed");
        assert_eq!(session.user.id, h.user.id);

        let authed = h
            .sessions
            .authenticate(bearer(&session.access_token).as_deref())
            .unwrap();
        assert_eq!(authed, h.user.id);

        h.clock.advance(Duration::seconds(5));
        let refreshed = h
            .sessions
            .refresh(bearer(&session.refresh_token.token).as_deref())
            .await
            .unwrap();
        assert_ne!(refreshed, session.access_token);
        assert_eq!(
            h.sessions.authenticate(bearer(&refreshed).as_deref()).unwrap(),
            h.user.id
        );

        h.sessions
            .revoke(bearer(&session.refresh_token.token).as_deref())
            .await
            .unwrap();
        assert!(matches!(
            h.sessions
                .refresh(bearer(&session.refresh_token.token).as_deref())
                .await,
            Err(AuthError::Revoked)
        ));

        // Outstanding access tokens live until their own expiry
        assert_eq!(
            h.sessions
                .authenticate(bearer(&session.access_token).as_deref())
                .unwrap(),
            h.user.id
        );
        h.clock.advance(Duration::hours(1));
        assert!(matches!(
            h.sessions.authenticate(bearer(&session.access_token).as_deref()),
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness().await;

        let unknown = h.sessions.login("nobody@example.com", "pw123456", None).await;
        let wrong = h.sessions.login("a@example.com", "wrong-password", None).await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_password_verification() {
        // No other test hashes at this cost
        let cost = 4 + 2;
        let h = harness_with_cost(cost).await;
        assert!(!crate::auth::password::has_dummy_hash(cost));

        let unknown = h.sessions.login("nobody@example.com", "pw123456", None).await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(crate::auth::password::has_dummy_hash(cost));
    }

    #[tokio::test]
    async fn test_login_ignores_surrounding_whitespace_in_email() {
        let h = harness().await;

        let session = h
            .sessions
            .login("  a@example.com ", "pw123456", None)
            .await
            .unwrap();

        assert_eq!(session.user.id, h.user.id);
    }

    #[tokio::test]
    async fn test_login_honours_requested_ttl() {
        let h = harness().await;
        let session = h
            .sessions
            .login("a@example.com", "pw123456", Some(10))
            .await
            .unwrap();

        h.clock.advance(Duration::seconds(11));
        assert!(matches!(
            h.sessions.authenticate(bearer(&session.access_token).as_deref()),
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_refresh_does_not_rotate() {
        let h = harness().await;
        let session = h
            .sessions
            .login("a@example.com", "pw123456", None)
            .await
            .unwrap();
        let header = bearer(&session.refresh_token.token);

        for _ in 0..3 {
            h.clock.advance(Duration::days(1));
            assert!(h.sessions.refresh(header.as_deref()).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_refresh_after_expiry() {
        let h = harness().await;
        let session = h
            .sessions
            .login("a@example.com", "pw123456", None)
            .await
            .unwrap();

        h.clock.advance(Duration::days(61));
        assert!(matches!(
            h.sessions
                .refresh(bearer(&session.refresh_token.token).as_deref())
                .await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let h = harness().await;

        assert!(matches!(
            h.sessions.authenticate(None),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            h.sessions.refresh(Some("")).await,
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            h.sessions.revoke(None).await,
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let h = harness().await;
        let session = h
            .sessions
            .login("a@example.com", "pw123456", None)
            .await
            .unwrap();

        assert!(matches!(
            h.sessions
                .authenticate(bearer(&session.refresh_token.token).as_deref()),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            h.sessions
                .refresh(bearer(&session.access_token).as_deref())
                .await,
            Err(AuthError::NotFound)
        ));
    }
}
