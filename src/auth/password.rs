/// Password Hashing and Verification
///
/// Salted bcrypt hashing. The comparison inside `bcrypt::verify` is
/// constant-time; callers only ever see match or mismatch.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::AuthError;

/// bcrypt only reads the first 72 bytes; longer input is rejected instead of
/// being silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

const DUMMY_PASSWORD: &str = "chirpy-dummy-password";

lazy_static! {
    /// One throwaway hash per cost, built on first use
    static ref DUMMY_HASHES: Mutex<HashMap<u32, String>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    /// Hasher with an explicit bcrypt cost. Production code uses
    /// [`PasswordHasher::default`].
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password
    ///
    /// # Errors
    /// Returns `HashingError` if the password is longer than
    /// [`MAX_PASSWORD_BYTES`] or bcrypt fails
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::HashingError(format!(
                "password exceeds {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        hash(plaintext, self.cost).map_err(|e| AuthError::HashingError(e.to_string()))
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// # Errors
    /// Returns `HashingError` if the stored hash is malformed
    pub fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, AuthError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        verify(plaintext, hashed).map_err(|e| AuthError::HashingError(e.to_string()))
    }

    /// [`hash`](Self::hash) on the blocking thread pool, keeping the slow
    /// computation off the request executor.
    pub async fn spawn_hash(&self, plaintext: String) -> Result<String, AuthError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::HashingError(format!("hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool.
    pub async fn spawn_verify(&self, plaintext: String, hashed: String) -> Result<bool, AuthError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hashed))
            .await
            .map_err(|e| AuthError::HashingError(format!("verification task failed: {}", e)))?
    }

    /// Run a full verification against a throwaway hash of this cost and
    /// discard the result. Lets a lookup miss cost the same as a mismatch.
    pub async fn spawn_verify_dummy(&self, plaintext: String) -> Result<(), AuthError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || {
            let dummy = hasher.dummy_hash()?;
            hasher.verify(&plaintext, &dummy).map(|_| ())
        })
        .await
        .map_err(|e| AuthError::HashingError(format!("verification task failed: {}", e)))?
    }

    fn dummy_hash(&self) -> Result<String, AuthError> {
        let mut hashes = DUMMY_HASHES
            .lock()
            .map_err(|_| AuthError::HashingError("dummy hash cache poisoned".to_string()))?;

        if let Some(existing) = hashes.get(&self.cost) {
            return Ok(existing.clone());
        }

        let created = self.hash(DUMMY_PASSWORD)?;
        hashes.insert(self.cost, created.clone());
        Ok(created)
    }
}

#[cfg(test)]
pub(crate) fn has_dummy_hash(cost: u32) -> bool {
    DUMMY_HASHES
        .lock()
        .map(|hashes| hashes.contains_key(&cost))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4)
    }

    #[test]
    fn test_hash_password() {
        let password = "pw123456";
        let hashed = hasher().hash(password).expect("Failed to hash password");

        assert_ne!(password, hashed);
        assert!(hashed.starts_with("$2"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hasher().hash("pw123456").unwrap();
        let second = hasher().hash("pw123456").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_sampled_passwords() {
        let samples = ["pw123456", "correct horse battery staple", "ünïcødé-pässwörd", "x"];
        let hasher = hasher();

        for (i, password) in samples.iter().enumerate() {
            let hashed = hasher.hash(password).expect("Failed to hash password");
            assert!(hasher.verify(password, &hashed).unwrap(), "{} should verify", password);

            for (j, other) in samples.iter().enumerate() {
                if i != j {
                    assert!(
                        !hasher.verify(other, &hashed).unwrap(),
                        "{} must not verify against hash of {}",
                        other,
                        password
                    );
                }
            }
        }
    }

    #[test]
    fn test_too_long_password() {
        let long_password = "a".repeat(MAX_PASSWORD_BYTES + 1);
        let result = hasher().hash(&long_password);

        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }

    #[test]
    fn test_long_passwords_sharing_a_prefix_do_not_collide() {
        let hasher = hasher();
        let base = "a".repeat(MAX_PASSWORD_BYTES);
        let hashed = hasher.hash(&base).unwrap();

        assert!(!hasher.verify(&format!("{}b", base), &hashed).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        let result = hasher().verify("pw123456", "not-a-bcrypt-hash");

        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }

    #[tokio::test]
    async fn test_dummy_verify_never_errors_on_input() {
        let hasher = hasher();

        assert!(hasher.spawn_verify_dummy("pw123456".to_string()).await.is_ok());
        assert!(hasher.spawn_verify_dummy(DUMMY_PASSWORD.to_string()).await.is_ok());
        assert!(hasher.spawn_verify_dummy("a".repeat(100)).await.is_ok());
        assert!(has_dummy_hash(4));
    }

    #[tokio::test]
    async fn test_spawned_hash_and_verify() {
        let hasher = hasher();
        let hashed = hasher.spawn_hash("pw123456".to_string()).await.unwrap();

        assert!(hasher
            .spawn_verify("pw123456".to_string(), hashed.clone())
            .await
            .unwrap());
        assert!(!hasher
            .spawn_verify("pw654321".to_string(), hashed)
            .await
            .unwrap());
    }
}
