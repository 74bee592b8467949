/// Authentication Routes
///
/// Login, access token refresh, and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::bearer::authorization_header;
use crate::auth::SessionOrchestrator;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::store::UserProfile;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub expires_in_seconds: Option<i64>,
}

/// Login response: the user profile plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown email or wrong password (same response for both)
/// - 500: hashing or token infrastructure failure
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let form = form.into_inner();

    let session = sessions
        .login(&form.email, &form.password, form.expires_in_seconds)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        user_id = %session.user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserProfile::from(&session.user),
        token: session.access_token,
        refresh_token: session.refresh_token.token,
    }))
}

/// POST /api/refresh
///
/// Exchange `Authorization: Bearer <refresh_token>` for a new one-hour
/// access token. The refresh token is not rotated.
///
/// # Errors
/// - 400: missing Authorization header
/// - 401: refresh token unknown, expired or revoked
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let token = sessions.refresh(authorization_header(req.headers())).await?;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 400: missing Authorization header or unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke");

    sessions
        .revoke(authorization_header(req.headers()))
        .await
        .map_err(|e| match e {
            AuthError::NotFound => AppError::UnknownRefreshToken,
            other => AppError::Auth(other),
        })?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        "Refresh token revoked"
    );

    Ok(HttpResponse::NoContent().finish())
}
