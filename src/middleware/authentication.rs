/// Access token authentication for protected routes
///
/// Handlers that take an [`AuthenticatedUser`] argument only run once the
/// `Authorization: Bearer <access_token>` header has been verified. Any
/// failure becomes a 401 with a generic body; the reason is logged.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::bearer::authorization_header;
use crate::auth::SessionOrchestrator;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let sessions = match req.app_data::<web::Data<SessionOrchestrator>>() {
            Some(sessions) => sessions,
            None => {
                return ready(Err(AppError::Internal(
                    "session orchestrator not registered".to_string(),
                )))
            }
        };

        let result = sessions
            .authenticate(authorization_header(req.headers()))
            .map(AuthenticatedUser)
            .map_err(|e| {
                tracing::warn!(path = %req.path(), reason = %e, "Access token rejected");
                AppError::Unauthenticated(e)
            });

        if let Ok(user) = &result {
            tracing::debug!(user_id = %user.0, "Access token validated");
        }

        ready(result)
    }
}
