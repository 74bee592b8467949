/// Bearer credential extraction
///
/// `Authorization: Bearer <token>`. Only the exact `"Bearer "` prefix is
/// stripped; a value without it is returned verbatim.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization` header value
///
/// # Errors
/// Returns `MissingCredential` if the header is absent or empty. An empty
/// remainder after the prefix is returned as-is and rejected downstream.
pub fn extract(header_value: Option<&str>) -> Result<&str, AuthError> {
    match header_value {
        None | Some("") => Err(AuthError::MissingCredential),
        Some(value) => Ok(value.strip_prefix(BEARER_PREFIX).unwrap_or(value)),
    }
}

/// The `Authorization` header as a string, if present and valid UTF-8
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}
