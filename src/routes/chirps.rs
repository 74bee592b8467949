/// Chirp Routes

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::moderation::moderate_chirp;
use crate::store::ChirpRepository;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

fn parse_chirp_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(ValidationError::InvalidFormat("chirp id".to_string())))
}

/// POST /api/chirps
pub async fn create_chirp(
    user: AuthenticatedUser,
    form: web::Json<ChirpRequest>,
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_creation");
    let body = moderate_chirp(&form.body)?;

    let chirp = chirps.create(&body, user.id()).await?;

    tracing::info!(
        request_id = %context.request_id,
        chirp_id = %chirp.id,
        user_id = %chirp.user_id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps
pub async fn list_chirps(chirps: web::Data<dyn ChirpRepository>) -> Result<HttpResponse, AppError> {
    let all = chirps.list().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<String>,
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let id = parse_chirp_id(&path)?;

    let chirp = chirps.find(id).await?.ok_or(AppError::NotFound("chirp"))?;
    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{chirp_id}
///
/// Only the author may delete a chirp.
pub async fn delete_chirp(
    user: AuthenticatedUser,
    path: web::Path<String>,
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_deletion");
    let id = parse_chirp_id(&path)?;

    let chirp = chirps.find(id).await?.ok_or(AppError::NotFound("chirp"))?;
    if chirp.user_id != user.id() {
        return Err(AppError::Forbidden(format!(
            "user {} does not own chirp {}",
            user.id(),
            chirp.id
        )));
    }

    if !chirps.delete(id).await? {
        return Err(AppError::NotFound("chirp"));
    }

    tracing::info!(
        request_id = %context.request_id,
        chirp_id = %id,
        "Chirp deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
