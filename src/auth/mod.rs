/// Authentication module
///
/// Password hashing, signed access tokens, persisted refresh tokens,
/// bearer credential parsing, and the session flows composed from them.

pub mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::{Claims, ISSUER};
pub use jwt::AccessTokenCodec;
pub use password::{PasswordHasher, MAX_PASSWORD_BYTES};
pub use refresh_token::{generate_refresh_token, refresh_token_ttl, token_fingerprint, RefreshTokenStore};
pub use session::{effective_ttl, max_access_token_ttl, LoginSession, SessionOrchestrator};
