/// Error Handling Module
///
/// Domain error types for validation and authentication, the unified
/// [`AppError`] returned by request handlers, and its mapping onto HTTP
/// responses. Internal distinctions are logged server-side; clients only
/// see a generic message, a code and a request id.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::store::StoreError;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(String),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(String, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(String, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(String),
    #[error("malformed request: {0}")]
    MalformedBody(String),
}

/// Authentication and session failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing credential")]
    MissingCredential,
    #[error("access token invalid")]
    TokenInvalid,
    #[error("access token expired")]
    TokenExpired,
    #[error("access token issuer mismatch")]
    TokenIssuerMismatch,
    #[error("access token subject is not a user id")]
    MalformedSubject,
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token expired")]
    Expired,
    #[error("refresh token revoked")]
    Revoked,
    #[error("password hashing failed: {0}")]
    HashingError(String),
    #[error("token signing failed: {0}")]
    TokenSigning(String),
    #[error("random source failed: {0}")]
    RandomSource(String),
    #[error("reset is only allowed on the dev platform")]
    ResetForbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Any failure while authenticating a protected route
    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthError),
    #[error("refresh token does not exist")]
    UnknownRefreshToken,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// ============================================================================
/// 3. HTTP RESPONSE MAPPING
/// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating with server logs
    pub error_id: String,
    /// Generic human-readable message
    pub error: String,
    /// Error code for client-side handling
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, error: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            error,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

fn store_status(err: &StoreError) -> (StatusCode, &'static str, &'static str) {
    match err {
        StoreError::Duplicate(_) => (StatusCode::CONFLICT, "DUPLICATE_ENTRY", "Duplicate entry"),
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found"),
        StoreError::ForeignKey(_) => (
            StatusCode::BAD_REQUEST,
            "INVALID_REFERENCE",
            "Referenced record does not exist",
        ),
        StoreError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service temporarily unavailable",
        ),
        StoreError::Backend(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            "Database error occurred",
        ),
    }
}

fn auth_status(err: &AuthError) -> (StatusCode, &'static str, &'static str) {
    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Incorrect email or password",
        ),
        AuthError::MissingCredential => (
            StatusCode::BAD_REQUEST,
            "MISSING_CREDENTIAL",
            "No valid token provided",
        ),
        AuthError::TokenInvalid
        | AuthError::TokenExpired
        | AuthError::TokenIssuerMismatch
        | AuthError::MalformedSubject
        | AuthError::NotFound
        | AuthError::Expired
        | AuthError::Revoked => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized"),
        AuthError::ResetForbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden"),
        AuthError::HashingError(_) | AuthError::TokenSigning(_) | AuthError::RandomSource(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        ),
        AuthError::Store(e) => store_status(e),
    }
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", ""),
            AppError::Auth(e) => auth_status(e),
            AppError::Store(e) => store_status(e),
            AppError::Unauthenticated(_) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized")
            }
            AppError::UnknownRefreshToken => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_TOKEN",
                "Refresh token does not exist",
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", ""),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden"),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.classify();

        // Validation and lookup messages carry no secrets and help the client
        let message = match self {
            AppError::Validation(_) | AppError::NotFound(_) => self.to_string(),
            _ => message.to_string(),
        };

        let error_response =
            ErrorResponse::new(request_id.to_string(), message, code.to_string(), status.as_u16());

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        let (status, _, _) = self.classify();

        if status.is_server_error() {
            tracing::error!(request_id = request_id, error = %self, "Request failed");
            return;
        }

        match self {
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, error = %self, "Invalid credentials attempt");
            }
            AppError::Auth(_) | AppError::Unauthenticated(_) | AppError::UnknownRefreshToken => {
                tracing::warn!(request_id = request_id, error = %self, "Authentication error");
            }
            AppError::Store(StoreError::Duplicate(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            _ => {
                tracing::info!(request_id = request_id, error = %self, "Request rejected");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-request context attached to handler log lines
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
        }
    }
}
