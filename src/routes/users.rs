/// User Routes
///
/// Registration and credential updates.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::SessionOrchestrator;
use crate::error::{AppError, ErrorContext};
use crate::middleware::AuthenticatedUser;
use crate::store::{UserProfile, UserRepository};
use crate::validators::{is_valid_email, is_valid_password};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl CredentialsRequest {
    fn validated(self) -> Result<(String, String), AppError> {
        let email = is_valid_email(&self.email)?;
        is_valid_password(&self.password)?;
        Ok((email, self.password))
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or password
/// - 409: email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");
    let (email, password) = form.into_inner().validated()?;

    let hashed_password = sessions.hasher().spawn_hash(password).await?;
    let user = users.create(&email, &hashed_password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserProfile::from(&user)))
}

/// PUT /api/users
///
/// Replace the authenticated user's email and password.
///
/// # Errors
/// - 401: missing or invalid access token
/// - 400: invalid email or password
/// - 409: email belongs to another user
pub async fn update_user(
    user: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update");
    let (email, password) = form.into_inner().validated()?;

    let hashed_password = sessions.hasher().spawn_hash(password).await?;
    let updated = users
        .update_password(user.id(), &email, &hashed_password)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %updated.id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(UserProfile::from(&updated)))
}
