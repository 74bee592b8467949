/// Admin Routes
///
/// File server metrics and the dev-only state reset.

use actix_web::{web, HttpResponse};

use crate::auth::SessionOrchestrator;
use crate::configuration::Platform;
use crate::error::AppError;
use crate::middleware::HitCounter;

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<HitCounter>) -> HttpResponse {
    let page = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits.count()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

/// POST /admin/reset
///
/// Zeroes the hit counter and deletes all users, tokens and chirps.
///
/// # Errors
/// - 403: platform is not `dev`
pub async fn reset(
    platform: web::Data<Platform>,
    hits: web::Data<HitCounter>,
    sessions: web::Data<SessionOrchestrator>,
) -> Result<HttpResponse, AppError> {
    sessions.reset_all(*platform.get_ref()).await?;
    hits.reset();

    tracing::warn!("All user state and metrics reset");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("OK"))
}
